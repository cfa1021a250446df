use winit::event::*;

use crate::{
    app::{ System, State },
    data::prelude::*,
    error::ObjectError,
    renderer::{
        self,
        Renderer,
        RendererConfig,
        display_list::DisplayList,
        gpu::LayerCompositor,
    },
};

pub mod controller;
pub mod scene;
pub mod session;
pub mod tools;

use controller::PointerEvent;
pub use scene::Visualization;
use session::ToolSession;

/// Zoom factor per wheel notch.
const SCALE_SPEED: f32 = 0.8;
/// Pixel deltas per wheel notch on touchpads.
const PIXELS_PER_LINE: f32 = 40.0;

pub struct InputState {
    pub left: ElementState,
    pub middle: ElementState,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            left: ElementState::Released,
            middle: ElementState::Released,
        }
    }
}

/// Cursor in logical window pixels.
#[derive(Default)]
pub struct CursorState {
    pub pos: ScreenPoint,
}

/// The editing canvas: routes window input to the active tool and the view,
/// repaints dirty layers and composites them on the GPU.
pub struct SceneSystem {
    pub session: ToolSession,
    pub renderer: Renderer<DisplayList>,
    compositor: Option<LayerCompositor>,
    input_state: InputState,
    cursor_state: CursorState,
    shift: bool,
    scale_factor: f64,
}

impl SceneSystem {
    pub fn new(vis: Visualization, data: Box<dyn Dataset>) -> Self {
        Self {
            session: ToolSession::new(vis, data),
            renderer: Renderer::new(DisplayList::new),
            compositor: None,
            input_state: InputState::default(),
            cursor_state: CursorState::default(),
            shift: false,
            scale_factor: 1.0,
        }
    }

    fn pointer_event(&self) -> PointerEvent {
        PointerEvent::new(self.renderer.view(), self.cursor_state.pos, self.shift)
    }

    /// Activates the tool called `name`. Returns false for an unknown name.
    pub fn set_tool_by_name(&mut self, name: &str) -> bool {
        match tools::tool_by_name(name) {
            Some(tool) => {
                self.session.set_tool(tool);
                true
            }
            None => {
                log::warn!("unknown tool `{}`", name);
                false
            }
        }
    }

    pub fn auto_view(&mut self) {
        let artboard = self.session.workspace.vis.artboard;
        self.renderer.auto_view(&artboard);
    }

    pub fn cursor_moved(&mut self, pos: ScreenPoint) {
        let moved = pos - self.cursor_state.pos;
        self.cursor_state.pos = pos;

        if self.input_state.middle == ElementState::Pressed {
            self.renderer.pan(moved);
        } else {
            let event = self.pointer_event();
            self.session.pointer_move(&event);
        }
    }

    pub fn mouse_input(&mut self, button: MouseButton, state: ElementState) -> bool {
        match button {
            MouseButton::Left => {
                if self.input_state.left == state {
                    return true;
                }
                self.input_state.left = state;
                let event = self.pointer_event();
                match state {
                    ElementState::Pressed => self.session.pointer_down(&event),
                    ElementState::Released => self.session.pointer_up(&event),
                }
            }
            MouseButton::Middle => self.input_state.middle = state,
            _ => return false,
        }
        true
    }

    /// Zooms about the cursor, `lines` notches at a time.
    pub fn wheel(&mut self, lines: f32) {
        self.renderer.zoom_about(self.cursor_state.pos, SCALE_SPEED.powf(-lines));
    }

    pub fn window_resized(&mut self, size: winit::dpi::PhysicalSize<u32>, scale_factor: f64) {
        self.scale_factor = scale_factor;
        let logical = size.to_logical::<f32>(scale_factor);
        self.renderer.set_resolution_ratio(scale_factor as f32);
        self.renderer.resize(ScreenSize::new(logical.width, logical.height));
    }

    /// Paints whatever the workspace invalidated. Returns whether a layer was painted.
    pub fn step(&mut self) -> bool {
        let dirty = self.session.workspace.take_dirty();
        self.renderer.trigger(dirty);
        let ws = &self.session.workspace;
        self.renderer.render(&ws.vis, &*ws.data, &self.session)
    }

    /// Configuration errors met while painting since the last call.
    pub fn take_errors(&mut self) -> Vec<ObjectError> {
        self.renderer.take_errors()
    }

    pub fn save_config(&self, path: &std::path::Path) -> anyhow::Result<()> {
        self.renderer.config().save(path)
    }

    pub fn load_config(&mut self, path: &std::path::Path) -> anyhow::Result<()> {
        let config = RendererConfig::load(path)?;
        self.renderer.set_config(&config);
        Ok(())
    }

    pub fn export_vector(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let ws = &self.session.workspace;
        std::fs::write(path, renderer::render_vector(&ws.vis, &*ws.data)?)?;
        log::info!("exported {}", path.display());
        Ok(())
    }

    pub fn export_raster(&self, path: &std::path::Path, ratio: f32) -> anyhow::Result<()> {
        let ws = &self.session.workspace;
        let pixmap = renderer::render_raster(&ws.vis, &*ws.data, ratio)?;
        std::fs::write(path, renderer::raster::encode_png(&pixmap)?)?;
        log::info!("exported {}", path.display());
        Ok(())
    }
}

impl System for SceneSystem {
    fn start(&mut self, state: &State) {
        self.compositor = Some(LayerCompositor::new(state));
        self.window_resized(state.size(), state.window.scale_factor());
        self.auto_view();
    }

    fn update(&mut self, state: &State) {
        self.step();
        if let Some(compositor) = &mut self.compositor {
            compositor.upload(&mut self.renderer, state);
        }
    }

    fn precess(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, v) => *v,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                self.wheel(lines);
                true
            },
            WindowEvent::MouseInput { state, button, .. } => self.mouse_input(*button, *state),
            WindowEvent::CursorMoved { position, .. } => {
                let position = position.to_logical::<f32>(self.scale_factor);
                self.cursor_moved(ScreenPoint::new(position.x, position.y));
                false
            },
            WindowEvent::ModifiersChanged(modifiers) => {
                self.shift = modifiers.shift();
                false
            },
            WindowEvent::KeyboardInput {
                input: KeyboardInput {
                    virtual_keycode: Some(VirtualKeyCode::Escape),
                    state: ElementState::Pressed,
                    ..
                },
                ..
            } => {
                self.session.clear_tool();
                true
            },
            WindowEvent::Resized(physical_size) => {
                self.window_resized(*physical_size, self.scale_factor);
                false
            },
            WindowEvent::ScaleFactorChanged { scale_factor, new_inner_size } => {
                self.window_resized(**new_inner_size, *scale_factor);
                false
            },
            _ => false
        }
    }

    fn render(&mut self, state: &State, view: &wgpu::TextureView) {
        if let Some(compositor) = &self.compositor {
            compositor.render(state, view);
        }
    }
}

#[cfg(test)]
mod test_scene_system {
    use super::*;
    use crate::data::dataset::JsonDataset;
    use crate::objects::*;
    use crate::renderer::canvas::Canvas;

    fn system() -> SceneSystem {
        let data = JsonDataset::from_str(r#"{ "cars": [ { "mpg": 10 }, { "mpg": 30 } ] }"#).unwrap();
        SceneSystem::new(Visualization::default(), Box::new(data))
    }

    fn click(system: &mut SceneSystem, at: ScreenPoint) {
        system.cursor_moved(at);
        system.mouse_input(MouseButton::Left, ElementState::Pressed);
        system.mouse_input(MouseButton::Left, ElementState::Released);
    }

    #[test]
    fn test_click_creates_circle() {
        let mut system = system();
        assert!(system.set_tool_by_name("Circle"));
        system.session.workspace.selected_path = Some(Path::new("cars"));

        click(&mut system, ScreenPoint::new(310.0, 190.0));

        let vis = &system.session.workspace.vis;
        assert_eq!(vis.order().len(), 1);
        let circle = vis.get(vis.order()[0]).unwrap();
        assert!(matches!(circle.kind, Kind::Circle(_)));
        assert!(system.step());
        assert!(!system.renderer.layer(Layer::Main).commands().is_empty());
    }

    #[test]
    fn test_middle_drag_pans() {
        let mut system = system();
        system.cursor_moved(ScreenPoint::new(100.0, 100.0));
        system.mouse_input(MouseButton::Middle, ElementState::Pressed);
        system.cursor_moved(ScreenPoint::new(110.0, 120.0));
        system.mouse_input(MouseButton::Middle, ElementState::Released);

        assert_eq!(system.renderer.view().center, ScreenVector::new(10.0, -20.0));
    }

    #[test]
    fn test_wheel_keeps_cursor_fixed() {
        let mut system = system();
        let at = ScreenPoint::new(400.0, 100.0);
        system.cursor_moved(at);
        let before = system.renderer.view().offset_from_screen(at);
        system.wheel(1.0);

        assert!((system.renderer.view().scale - 1.25).abs() < 1e-5);
        let after = system.renderer.view().offset_from_screen(at);
        assert!((before - after).length() < 1e-3);
    }

    #[test]
    fn test_unknown_tool() {
        let mut system = system();
        assert!(!system.set_tool_by_name("Polygon"));
        assert_eq!(system.session.tool_name(), None);
    }

    #[test]
    fn test_window_resize_uses_logical_size() {
        let mut system = system();
        system.window_resized(winit::dpi::PhysicalSize::new(1600, 1200), 2.0);

        assert_eq!(system.renderer.view().size, ScreenSize::new(800.0, 600.0));
        assert_eq!(system.renderer.layer(Layer::Main).size(), DeviceSize::new(1600.0, 1200.0));
    }
}
