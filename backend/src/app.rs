use winit::{
    event::*,
    event_loop::{ ControlFlow, EventLoop },
    window::Window,
};

/// Installs the `RUST_LOG` driven logger. Call once before building the app.
pub fn init() {
    env_logger::init();
}

#[allow(unused)]
pub trait System {
    fn start(&mut self, state: &State) {}
    fn finish(&mut self) {}
    fn update(&mut self, state: &State) {}
    fn render(&mut self, state: &State, view: &wgpu::TextureView) {}
    fn precess(&mut self, event: &winit::event::WindowEvent) -> bool { false }
}

pub struct App<T: 'static> {
    pub state: State,
    pub event_loop: EventLoop<T>,
}

impl<T> App<T> {
    pub fn new(event_loop: EventLoop<T>, window: Window) -> anyhow::Result<Self> {
        Ok(Self {
            state: State::new(window)?,
            event_loop,
        })
    }

    pub fn run<S: System + 'static>(self, mut system: S) -> ! {
        let (mut state, event_loop) = (self.state, self.event_loop);

        system.start(&state);

        event_loop.run(move |event, _, control_flow| {
            match event {
                Event::WindowEvent { window_id, ref event }
                    if window_id == state.window.id()
                    && !system.precess(event)
                    => {
                    match event {
                        WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                        WindowEvent::Resized(physical_size) => state.on_resize(*physical_size),
                        WindowEvent::ScaleFactorChanged { new_inner_size, .. } => state.on_resize(**new_inner_size),
                        _ => {}
                    }
                },
                Event::RedrawRequested(window_id) if window_id == state.window.id() => {
                    match state.next_frame() {
                        Ok((output, view)) => {
                            system.render(&state, &view);
                            output.present();
                        },
                        // Surface lost, configure it again.
                        Err(wgpu::SurfaceError::Lost) => state.on_resize(state.size()),
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("surface out of memory, exiting");
                            *control_flow = ControlFlow::Exit;
                        },
                        // Outdated or timed out, the next frame recovers.
                        Err(e) => log::warn!("skipped frame: {:?}", e),
                    }
                }
                Event::MainEventsCleared => {
                    system.update(&state);
                    state.window.request_redraw();
                }
                Event::LoopDestroyed => system.finish(),
                _ => {}
            }
        })
    }
}

pub struct State {
    pub window: Window,
    pub surface: wgpu::Surface,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
}

impl State {
    pub fn new(window: Window) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::Backends::all());
        let surface = unsafe { instance.create_surface(&window) };
        let adapter = pollster::block_on(instance.request_adapter(
            &wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            }
        )).ok_or_else(|| anyhow::anyhow!("no graphics adapter compatible with the window"))?;
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                features: wgpu::Features::empty(),
                limits: wgpu::Limits::default(),
                label: None,
            },
            None,
        ))?;
        log::info!("rendering with {:?}", adapter.get_info().backend);

        let format = *surface.get_supported_formats(&adapter)
            .first()
            .ok_or_else(|| anyhow::anyhow!("the surface supports no texture format"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
        };
        surface.configure(&device, &config);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
        })
    }

    pub fn on_resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width * new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn size(&self) -> winit::dpi::PhysicalSize<u32> {
        winit::dpi::PhysicalSize::new(self.config.width, self.config.height)
    }

    pub fn next_frame(&self) -> Result<(wgpu::SurfaceTexture, wgpu::TextureView), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok((output, view))
    }
}
