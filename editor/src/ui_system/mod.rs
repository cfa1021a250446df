use vis_backend::{
    app::{
        System,
        App,
        State,
    },
    scene_system::SceneSystem,
};

use egui_wgpu::renderer::{
    RenderPass,
    ScreenDescriptor
};

mod panel;
mod object_list;

/// egui panels drawn over the editing canvas.
pub struct UiSystem {
    state: egui_winit::State,
    ctx: egui::Context,
    rpass: egui_wgpu::renderer::RenderPass,

    panel: panel::EditorPanel,
    object_list: object_list::ObjectList,

    output_data: Option<(egui::TexturesDelta, Vec<egui::ClippedPrimitive>)>,

    scene: SceneSystem,
}

impl UiSystem {
    pub fn new<T>(app: &App<T>, scene: SceneSystem) -> Self {
        Self {
            state: egui_winit::State::new(&app.event_loop),
            ctx: egui::Context::default(),
            rpass: RenderPass::new(
                &app.state.device,
                app.state.config.format,
                1
            ),
            panel: panel::EditorPanel::new(&scene),
            object_list: object_list::ObjectList::new(),
            output_data: None,
            scene,
        }
    }
}

impl System for UiSystem {
    fn start(&mut self, state: &State) {
        self.ctx.set_visuals(egui::Visuals::light());
        self.scene.start(state);
    }

    fn finish(&mut self) {
        self.scene.finish();
    }

    fn precess(&mut self, event: &winit::event::WindowEvent) -> bool {
        use winit::event::*;

        if self.state.on_event(&self.ctx, event) {
            return true;
        }
        match event {
            WindowEvent::KeyboardInput {
                input: KeyboardInput {
                    virtual_keycode: Some(VirtualKeyCode::F2),
                    state: ElementState::Pressed,
                    ..
                },
                ..
            } => {
                self.object_list.open = !self.object_list.open;
                true
            },
            _ => self.scene.precess(event),
        }
    }

    fn update(&mut self, state: &State) {
        // Begin to draw the UI frame.
        let raw_input = self.state.take_egui_input(&state.window);
        let full_output = self.ctx.run(raw_input, |ctx| {
            self.panel.ui(ctx, &mut self.scene);
            self.object_list.ui(ctx, &mut self.scene);
        });

        let paint_jobs = self.ctx.tessellate(full_output.shapes);

        self.output_data = Some((full_output.textures_delta, paint_jobs));
        self.state.handle_platform_output(&state.window, &self.ctx, full_output.platform_output);

        self.scene.update(state);
    }

    fn render(&mut self, state: &State, view: &wgpu::TextureView) {
        self.scene.render(state, view);

        if let Some((textures_delta, paint_jobs)) = self.output_data.take() {
            let mut encoder = state.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });

            // Upload all resources for the GPU.
            let screen_descriptor = ScreenDescriptor {
                size_in_pixels: [state.config.width, state.config.height],
                pixels_per_point: self.state.pixels_per_point(),
            };
            for (id, ref image_delta) in textures_delta.set {
                self.rpass.update_texture(&state.device, &state.queue, id, image_delta);
            }
            self.rpass.update_buffers(&state.device, &state.queue, &paint_jobs, &screen_descriptor);

            // Draw on top of the canvas layers.
            self.rpass.execute(
                &mut encoder,
                view,
                &paint_jobs,
                &screen_descriptor,
                None,
            );
            state.queue.submit(std::iter::once(encoder.finish()));

            for id in &textures_delta.free {
                self.rpass.free_texture(id);
            }
        }
    }
}
