use crate::data::prelude::*;

use lyon::path::Winding;

/// Geometry handed to a canvas. Built in scene units, transformed to device pixels on draw.
pub type Outline = lyon::path::Path;

#[derive(Debug, Clone)]
pub struct CanvasState {
    pub transform: DeviceTransform,
    stack: Vec<DeviceTransform>,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            transform: DeviceTransform::identity(),
            stack: Vec::new(),
        }
    }
}

/// Drawing surface. Implementors only deal with device pixels; the provided
/// methods map scene geometry through the current transform.
pub trait Canvas {
    fn state(&self) -> &CanvasState;
    fn state_mut(&mut self) -> &mut CanvasState;

    fn size(&self) -> DeviceSize;
    fn resize(&mut self, size: DeviceSize);

    fn clear(&mut self);
    fn stroke_path(&mut self, outline: &Outline, color: Rgba8, width: f32);
    fn fill_path(&mut self, outline: &Outline, color: Rgba8);
    fn draw_text(&mut self, text: &str, position: DevicePoint, size: f32, color: Rgba8);

    fn save(&mut self) {
        let transform = self.state().transform;
        self.state_mut().stack.push(transform);
    }

    fn restore(&mut self) {
        match self.state_mut().stack.pop() {
            Some(transform) => self.state_mut().transform = transform,
            None => log::warn!("canvas restore without a matching save"),
        }
    }

    fn transform(&self) -> DeviceTransform {
        self.state().transform
    }

    fn set_transform(&mut self, transform: DeviceTransform) {
        self.state_mut().transform = transform;
    }

    /// Applies `local` before the current transform, e.g. a component frame.
    fn append_transform(&mut self, local: &LocalTransform) {
        let current = self.transform();
        self.set_transform(local.then(&current));
    }

    /// Device pixels per scene unit.
    fn pixel_scale(&self) -> f32 {
        self.transform().determinant().abs().sqrt()
    }

    /// Scene width of a one pixel line, constant under zoom.
    fn guide_line_width(&self) -> f32 {
        let scale = self.pixel_scale();
        if scale > 0.0 { 1.0 / scale } else { 1.0 }
    }

    fn stroke(&mut self, outline: &Outline, color: Rgba8, width: f32) {
        let device = outline.clone().transformed(&self.transform().to_untyped());
        let width = width * self.pixel_scale();
        self.stroke_path(&device, color, width);
    }

    fn fill(&mut self, outline: &Outline, color: Rgba8) {
        let device = outline.clone().transformed(&self.transform().to_untyped());
        self.fill_path(&device, color);
    }

    /// Upright text anchored at `at`, `size` in scene units.
    fn fill_text(&mut self, text: &str, at: ScenePoint, size: f32, color: Rgba8) {
        let position = self.transform().transform_point(at);
        let size = size * self.pixel_scale();
        self.draw_text(text, position, size, color);
    }
}

pub fn segment(from: ScenePoint, to: ScenePoint) -> Outline {
    polyline(&[from, to], false)
}

pub fn polyline(points: &[ScenePoint], closed: bool) -> Outline {
    let mut builder = Outline::builder();

    if let Some((first, rest)) = points.split_first() {
        builder.begin(first.to_untyped());
        rest.iter().for_each(|p| { builder.line_to(p.to_untyped()); });
        builder.end(closed);
    }
    builder.build()
}

/// Disconnected line segments in one outline.
pub fn segments<I: IntoIterator<Item = (ScenePoint, ScenePoint)>>(lines: I) -> Outline {
    let mut builder = Outline::builder();

    for (from, to) in lines {
        builder.begin(from.to_untyped());
        builder.line_to(to.to_untyped());
        builder.end(false);
    }
    builder.build()
}

pub fn circle(center: ScenePoint, radius: f32) -> Outline {
    let mut builder = Outline::builder();
    builder.add_circle(center.to_untyped(), radius, Winding::Positive);
    builder.build()
}

pub fn rectangle(rect: &SceneRect) -> Outline {
    polyline(
        &[
            rect.min(),
            ScenePoint::new(rect.max_x(), rect.min_y()),
            rect.max(),
            ScenePoint::new(rect.min_x(), rect.max_y()),
        ],
        true,
    )
}

pub fn cross(center: ScenePoint, half: f32) -> Outline {
    segments([
        (center - SceneVector::new(half, 0.0), center + SceneVector::new(half, 0.0)),
        (center - SceneVector::new(0.0, half), center + SceneVector::new(0.0, half)),
    ])
}

#[cfg(test)]
mod test_canvas {
    use super::*;
    use crate::renderer::display_list::{ Command, DisplayList };

    #[test]
    fn test_guide_width_tracks_zoom() {
        let mut canvas = DisplayList::new(DeviceSize::new(100.0, 100.0));
        let view = ViewData { scale: 4.0, ratio: 2.0, ..Default::default() };
        canvas.set_transform(DeviceTransform::look_to(&view));

        assert_eq!(canvas.pixel_scale(), 8.0);
        assert_eq!(canvas.guide_line_width(), 0.125);

        canvas.stroke(&segment(ScenePoint::origin(), ScenePoint::new(1.0, 0.0)), color::GUIDE, canvas.guide_line_width());
        match &canvas.commands()[0] {
            Command::Stroke { width, .. } => assert_eq!(*width, 1.0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_save_restore() {
        let mut canvas = DisplayList::new(DeviceSize::new(10.0, 10.0));
        canvas.save();
        canvas.append_transform(&LocalTransform::translation(5.0, 0.0));
        assert_eq!(canvas.transform().transform_point(ScenePoint::origin()), DevicePoint::new(5.0, 0.0));

        canvas.append_transform(&LocalTransform::scale(2.0, 2.0));
        assert_eq!(canvas.transform().transform_point(ScenePoint::new(1.0, 0.0)), DevicePoint::new(7.0, 0.0));

        canvas.restore();
        assert_eq!(canvas.transform(), DeviceTransform::identity());
    }

    #[test]
    fn test_polyline_events() {
        let outline = polyline(&[ScenePoint::new(0.0, 0.0), ScenePoint::new(1.0, 0.0), ScenePoint::new(1.0, 1.0)], true);
        assert_eq!(outline.iter().count(), 4);
        assert_eq!(polyline(&[], false).iter().count(), 0);
    }
}
