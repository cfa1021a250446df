use wgpu::util::DeviceExt;

use crate::{
    app::State,
    data::prelude::*,
};
use super::{
    Renderer,
    display_list::DisplayList,
    layer_index,
    tessellate::{ Mesh, Tessellator, Vertex },
};

struct LayerMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
}

/// Draws the four display list layers to the window surface, back to front.
/// Each layer keeps its GPU mesh until the renderer repaints it.
pub struct LayerCompositor {
    render_pipeline: wgpu::RenderPipeline,
    viewport_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    tessellator: Tessellator,
    meshes: [Option<LayerMesh>; 4],
    clear_color: wgpu::Color,
}

impl LayerCompositor {
    pub fn new(state: &State) -> Self {
        let viewport_buffer = state.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Viewport buffer"),
            size: std::mem::size_of::<[f32; 4]>() as u64,
            mapped_at_creation: false,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = state.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
            label: Some("viewport_bind_group_layout"),
        });
        let bind_group = state.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: viewport_buffer.as_entire_binding(),
                },
            ],
            label: Some("viewport_bind_group"),
        });

        let render_pipeline_layout = state.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Layer Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let shader = state.device.create_shader_module(wgpu::include_wgsl!("shader.wgsl"));
        let render_pipeline = state.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Layer Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[Vertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: state.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        let [r, g, b, a] = color::BACKGROUND.to_f32_array();
        Self {
            render_pipeline,
            viewport_buffer,
            bind_group,
            tessellator: Tessellator::new(),
            meshes: [None, None, None, None],
            clear_color: wgpu::Color { r: r as f64, g: g as f64, b: b as f64, a: a as f64 },
        }
    }

    /// Re-tessellates the layers painted since the last upload.
    pub fn upload(&mut self, renderer: &mut Renderer<DisplayList>, state: &State) {
        let painted = renderer.take_painted();
        if painted.is_empty() {
            return;
        }

        let size = renderer.view().device_size();
        state.queue.write_buffer(
            &self.viewport_buffer,
            0,
            bytemuck::cast_slice(&[size.width, size.height, 0.0, 0.0]),
        );

        for layer in painted.iter() {
            let mesh = self.tessellator.tessellate(renderer.layer(layer));
            self.meshes[layer_index(layer)] = Self::create_mesh(&mesh, layer, state);
        }
    }

    fn create_mesh(mesh: &Mesh, layer: Layer, state: &State) -> Option<LayerMesh> {
        if mesh.indices.is_empty() {
            return None;
        }
        let vertex_buffer = state.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", layer)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = state.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", layer)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Some(LayerMesh { vertex_buffer, index_buffer, num_indices: mesh.indices.len() as u32 })
    }

    pub fn render(&self, state: &State, view: &wgpu::TextureView) {
        let mut encoder = state.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Layer Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Layer Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);

            for layer in Layer::ALL {
                if let Some(mesh) = &self.meshes[layer_index(layer)] {
                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
                }
            }
        }

        state.queue.submit(std::iter::once(encoder.finish()));
    }
}
