use lyon::tessellation::{
    BuffersBuilder,
    FillOptions,
    FillTessellator,
    FillVertex,
    StrokeOptions,
    StrokeTessellator,
    StrokeVertex,
    TessellationError,
    VertexBuffers,
};

use crate::data::prelude::*;
use super::display_list::{ Command, DisplayList };

/// Device-space vertex with a straight alpha colour.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        static ATTRIBS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBS,
        }
    }
}

pub type Mesh = VertexBuffers<Vertex, u32>;

/// Turns display lists into triangle meshes. Text commands carry no geometry
/// and are skipped.
pub struct Tessellator {
    fill: FillTessellator,
    stroke: StrokeTessellator,
}

impl Default for Tessellator {
    fn default() -> Self {
        Self {
            fill: FillTessellator::new(),
            stroke: StrokeTessellator::new(),
        }
    }
}

impl Tessellator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tessellate(&mut self, list: &DisplayList) -> Mesh {
        let mut mesh = Mesh::new();
        for command in list.commands() {
            if let Err(e) = self.append(command, &mut mesh) {
                log::warn!("tessellation failed: {:?}", e);
            }
        }
        mesh
    }

    fn append(&mut self, command: &Command, mesh: &mut Mesh) -> Result<(), TessellationError> {
        match command {
            Command::Fill { outline, color } => {
                let color = color.to_f32_array();
                let mut builder = BuffersBuilder::new(mesh, |vertex: FillVertex| Vertex {
                    position: vertex.position().to_array(),
                    color,
                });
                self.fill.tessellate_path(outline, &FillOptions::default(), &mut builder)
            }
            Command::Stroke { outline, color, width } => {
                let color = color.to_f32_array();
                let options = StrokeOptions::default().with_line_width(width.max(f32::EPSILON));
                let mut builder = BuffersBuilder::new(mesh, |vertex: StrokeVertex| Vertex {
                    position: vertex.position().to_array(),
                    color,
                });
                self.stroke.tessellate_path(outline, &options, &mut builder)
            }
            Command::Text { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod test_tessellate {
    use super::*;
    use crate::renderer::canvas::{ Canvas, circle, segment };

    #[test]
    fn test_meshes_in_device_space() {
        let mut list = DisplayList::new(DeviceSize::new(100.0, 100.0));
        list.fill(&circle(ScenePoint::new(50.0, 50.0), 10.0), color::FILL);
        list.stroke(&segment(ScenePoint::new(0.0, 0.0), ScenePoint::new(100.0, 0.0)), color::GUIDE, 2.0);
        list.fill_text("label", ScenePoint::origin(), 10.0, color::FOREGROUND);

        let mesh = Tessellator::new().tessellate(&list);
        assert!(!mesh.indices.is_empty());
        assert_eq!(mesh.indices.len() % 3, 0);
        assert!(mesh.vertices.iter().all(|v| v.position[0] >= -1.0 && v.position[0] <= 101.0));
        assert!(mesh.vertices.iter().any(|v| v.color == color::GUIDE.to_f32_array()));
    }

    #[test]
    fn test_empty_list() {
        let list = DisplayList::new(DeviceSize::new(10.0, 10.0));
        let mesh = Tessellator::new().tessellate(&list);
        assert!(mesh.vertices.is_empty() && mesh.indices.is_empty());
    }
}
