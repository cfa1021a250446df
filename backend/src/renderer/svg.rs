use std::fmt::Write;

use lyon::path::Event;

use crate::data::prelude::*;
use super::canvas::{ Canvas, CanvasState, Outline };

/// SVG path data in device coordinates.
fn path_data(outline: &Outline) -> String {
    let mut d = String::new();
    for event in outline.iter() {
        // Writing to a String cannot fail.
        let _ = match event {
            Event::Begin { at } => write!(d, "M{:.2},{:.2}", at.x, at.y),
            Event::Line { to, .. } => write!(d, "L{:.2},{:.2}", to.x, to.y),
            Event::Quadratic { ctrl, to, .. } => write!(d, "Q{:.2},{:.2} {:.2},{:.2}", ctrl.x, ctrl.y, to.x, to.y),
            Event::Cubic { ctrl1, ctrl2, to, .. } => write!(
                d,
                "C{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}",
                ctrl1.x, ctrl1.y, ctrl2.x, ctrl2.y, to.x, to.y
            ),
            Event::End { close: true, .. } => write!(d, "Z"),
            Event::End { .. } => Ok(()),
        };
    }
    d
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

/// Canvas that collects SVG elements for vector export.
pub struct SvgCanvas {
    state: CanvasState,
    size: DeviceSize,
    elements: Vec<String>,
}

impl SvgCanvas {
    pub fn new(size: DeviceSize) -> Self {
        Self {
            state: CanvasState::default(),
            size,
            elements: Vec::new(),
        }
    }

    /// Number of elements drawn so far.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn finish(self) -> String {
        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" viewBox="0 0 {:.2} {:.2}">"#,
            self.size.width, self.size.height, self.size.width, self.size.height
        );
        for element in &self.elements {
            let _ = writeln!(svg, "  {}", element);
        }
        svg.push_str("</svg>\n");
        svg
    }
}

impl Canvas for SvgCanvas {
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
        self.elements.clear();
    }

    fn clear(&mut self) {
        self.elements.clear();
    }

    fn stroke_path(&mut self, outline: &Outline, color: Rgba8, width: f32) {
        let d = path_data(outline);
        if !d.is_empty() {
            self.elements.push(format!(
                r#"<path d="{}" fill="none" stroke="{}" stroke-width="{:.3}"/>"#,
                d, color.css(), width
            ));
        }
    }

    fn fill_path(&mut self, outline: &Outline, color: Rgba8) {
        let d = path_data(outline);
        if !d.is_empty() {
            self.elements.push(format!(r#"<path d="{}" fill="{}" stroke="none"/>"#, d, color.css()));
        }
    }

    fn draw_text(&mut self, text: &str, position: DevicePoint, size: f32, color: Rgba8) {
        self.elements.push(format!(
            r#"<text x="{:.2}" y="{:.2}" font-size="{:.2}" fill="{}">{}</text>"#,
            position.x, position.y, size, color.css(), escape(text)
        ));
    }
}

#[cfg(test)]
mod test_svg {
    use super::*;
    use crate::renderer::canvas::segment;

    #[test]
    fn test_flip_to_artboard() {
        let artboard = SceneRect::new(ScenePoint::new(-10.0, -5.0), SceneSize::new(20.0, 10.0));
        let mut canvas = SvgCanvas::new(DeviceSize::new(20.0, 10.0));
        canvas.set_transform(DeviceTransform::look_to_artboard(&artboard, 1.0));
        canvas.stroke(&segment(ScenePoint::new(-10.0, 5.0), ScenePoint::new(10.0, -5.0)), color::STROKE, 1.0);
        canvas.fill_text("a<b", ScenePoint::origin(), 4.0, color::FOREGROUND);

        let svg = canvas.finish();
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10""#));
        assert!(svg.contains(r#"d="M0.00,0.00L20.00,10.00""#));
        assert!(svg.contains(r#"x="10.00" y="5.00""#));
        assert!(svg.contains("a&lt;b"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
