use crate::data::prelude::*;
use super::canvas::{ Canvas, CanvasState, Outline };

#[derive(Debug, Clone)]
pub enum Command {
    Stroke { outline: Outline, color: Rgba8, width: f32 },
    Fill { outline: Outline, color: Rgba8 },
    Text { text: String, position: DevicePoint, size: f32, color: Rgba8 },
}

/// Canvas that records device-space commands. Live layers paint into one and
/// the compositor tessellates it for the GPU.
pub struct DisplayList {
    state: CanvasState,
    size: DeviceSize,
    commands: Vec<Command>,
    clears: usize,
}

impl DisplayList {
    pub fn new(size: DeviceSize) -> Self {
        Self {
            state: CanvasState::default(),
            size,
            commands: Vec::new(),
            clears: 0,
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// How many times the list has been cleared for a repaint.
    pub fn clears(&self) -> usize {
        self.clears
    }
}

impl Canvas for DisplayList {
    fn state(&self) -> &CanvasState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CanvasState {
        &mut self.state
    }

    fn size(&self) -> DeviceSize {
        self.size
    }

    fn resize(&mut self, size: DeviceSize) {
        self.size = size;
        self.commands.clear();
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.clears += 1;
    }

    fn stroke_path(&mut self, outline: &Outline, color: Rgba8, width: f32) {
        self.commands.push(Command::Stroke { outline: outline.clone(), color, width });
    }

    fn fill_path(&mut self, outline: &Outline, color: Rgba8) {
        self.commands.push(Command::Fill { outline: outline.clone(), color });
    }

    fn draw_text(&mut self, text: &str, position: DevicePoint, size: f32, color: Rgba8) {
        self.commands.push(Command::Text { text: text.to_string(), position, size, color });
    }
}
