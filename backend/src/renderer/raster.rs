use lyon::path::Event;
use tiny_skia::{ Color, FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform };

use crate::data::prelude::*;
use super::canvas::{ Canvas, CanvasState, Outline };

fn to_skia(outline: &Outline) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for event in outline.iter() {
        match event {
            Event::Begin { at } => pb.move_to(at.x, at.y),
            Event::Line { to, .. } => pb.line_to(to.x, to.y),
            Event::Quadratic { ctrl, to, .. } => pb.quad_to(ctrl.x, ctrl.y, to.x, to.y),
            Event::Cubic { ctrl1, ctrl2, to, .. } => pb.cubic_to(ctrl1.x, ctrl1.y, ctrl2.x, ctrl2.y, to.x, to.y),
            Event::End { close: true, .. } => pb.close(),
            Event::End { .. } => {}
        }
    }
    pb.finish()
}

fn paint(color: Rgba8) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r(), color.g(), color.b(), color.a());
    paint.anti_alias = true;
    paint
}

/// Canvas backed by a tiny-skia pixmap, used for bitmap export. Text is not drawn.
pub struct RasterCanvas {
    state: CanvasState,
    pixmap: Pixmap,
}

impl RasterCanvas {
    pub fn new(size: DeviceSize) -> anyhow::Result<Self> {
        let pixmap = Pixmap::new(size.width.round() as u32, size.height.round() as u32)
            .ok_or_else(|| anyhow::anyhow!("cannot allocate a {}x{} bitmap", size.width, size.height))?;
        Ok(Self { state: CanvasState::default(), pixmap })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }
}

impl Canvas for RasterCanvas {
    fn state(&self) -> &CanvasState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CanvasState {
        &mut self.state
    }

    fn size(&self) -> DeviceSize {
        DeviceSize::new(self.pixmap.width() as f32, self.pixmap.height() as f32)
    }

    fn resize(&mut self, size: DeviceSize) {
        match Pixmap::new(size.width.round() as u32, size.height.round() as u32) {
            Some(pixmap) => self.pixmap = pixmap,
            None => log::warn!("bitmap size {}x{} rejected", size.width, size.height),
        }
    }

    fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    fn stroke_path(&mut self, outline: &Outline, color: Rgba8, width: f32) {
        if let Some(path) = to_skia(outline) {
            let stroke = Stroke { width, ..Stroke::default() };
            self.pixmap.stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
        }
    }

    fn fill_path(&mut self, outline: &Outline, color: Rgba8) {
        if let Some(path) = to_skia(outline) {
            self.pixmap.fill_path(&path, &paint(color), FillRule::Winding, Transform::identity(), None);
        }
    }

    fn draw_text(&mut self, text: &str, _position: DevicePoint, _size: f32, _color: Rgba8) {
        log::trace!("bitmap export skips text `{}`", text);
    }
}

/// PNG bytes of `pixmap`.
pub fn encode_png(pixmap: &Pixmap) -> anyhow::Result<Vec<u8>> {
    Ok(pixmap.encode_png()?)
}
