//! Instanced discs: the marker, its current target, and the twelve pitch
//! ring segments around the stage.

use super::helpers;
use crate::constants::*;
use glam::{Mat4, Vec3};
use groove_core::{FrameOutput, Hsl, PitchClass, MARKER_WGSL};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct MarkerUniforms {
    view_proj: [[f32; 4]; 4],
    cam_right: [f32; 4],
    cam_up: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct InstanceData {
    pub pos: [f32; 3],
    pub scale: f32,
    pub color: [f32; 4],
    pub glow: f32,
}

pub(crate) struct MarkerResources {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    quad_vb: wgpu::Buffer,
    instance_vb: wgpu::Buffer,
    instance_count: u32,
}

pub(crate) fn create_marker_resources(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
) -> MarkerResources {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("marker_shader"),
        source: wgpu::ShaderSource::Wgsl(MARKER_WGSL.into()),
    });
    let uniform_buffer =
        helpers::uniform_buffer(device, "marker_uniforms", std::mem::size_of::<MarkerUniforms>());
    // two triangles, corners in [-0.5, 0.5]
    let quad_vertices: [f32; 12] = [
        -0.5, -0.5, 0.5, -0.5, 0.5, 0.5, -0.5, -0.5, 0.5, 0.5, -0.5, 0.5,
    ];
    let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("quad_vb"),
        contents: bytemuck::cast_slice(&quad_vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let instance_vb = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("instance_vb"),
        size: (std::mem::size_of::<InstanceData>() * MAX_INSTANCES) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("marker_bgl"),
        entries: &[helpers::uniform_layout_entry(0)],
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("marker_bg"),
        layout: &bgl,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }],
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("marker_pl"),
        bind_group_layouts: &[&bgl],
        push_constant_ranges: &[],
    });

    let vertex_buffers = [
        // slot 0: quad corners
        wgpu::VertexBufferLayout {
            array_stride: (std::mem::size_of::<f32>() * 2) as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 0,
                shader_location: 0,
            }],
        },
        // slot 1: per-disc data
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 1,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32,
                    offset: 12,
                    shader_location: 2,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: 16,
                    shader_location: 3,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32,
                    offset: 32,
                    shader_location: 4,
                },
            ],
        },
    ];
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("marker_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &vertex_buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState::default(),
        // drawn over the meshes
        depth_stencil: Some(wgpu::DepthStencilState {
            format: helpers::DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Always,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        cache: None,
        multiview: None,
    });

    MarkerResources {
        pipeline,
        uniform_buffer,
        bind_group,
        quad_vb,
        instance_vb,
        instance_count: 0,
    }
}

fn rgba(color: Hsl, alpha: f32) -> [f32; 4] {
    color.to_rgb().extend(alpha).to_array()
}

/// Disc instances for one frame: ring segments first, then target, then marker.
pub(crate) fn build_instances(out: &FrameOutput, max_radius: f32) -> Vec<InstanceData> {
    let mut instances = Vec::with_capacity(PitchClass::ALL.len() + 2);
    let ring_radius = max_radius + RING_MARGIN;
    for class in PitchClass::ALL {
        let level = out.ring[class.index()];
        let pos = class.ring_direction() * ring_radius;
        let hue = Hsl {
            hue: class.index() as f32 * 30.0,
            saturation: 70.0,
            lightness: 55.0,
        };
        instances.push(InstanceData {
            pos: pos.extend(0.0).to_array(),
            scale: (RING_DOT_BASE + RING_DOT_SPAN * level) * 2.0,
            color: rgba(hue, RING_ALPHA_BASE + (1.0 - RING_ALPHA_BASE) * level),
            glow: level * 0.5,
        });
    }
    let m = &out.marker;
    instances.push(InstanceData {
        pos: m.target.extend(0.0).to_array(),
        scale: TARGET_RADIUS * 2.0,
        color: rgba(m.color, TARGET_ALPHA),
        glow: 0.0,
    });
    instances.push(InstanceData {
        pos: m.position.extend(0.0).to_array(),
        scale: m.scale * MARKER_RADIUS * 2.0,
        color: rgba(m.color, 1.0),
        glow: m.pulse,
    });
    instances.truncate(MAX_INSTANCES);
    instances
}

impl MarkerResources {
    pub(crate) fn update(
        &mut self,
        queue: &wgpu::Queue,
        view: Mat4,
        view_proj: Mat4,
        instances: &[InstanceData],
    ) {
        let right: Vec3 = view.row(0).truncate();
        let up: Vec3 = view.row(1).truncate();
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&MarkerUniforms {
                view_proj: view_proj.to_cols_array_2d(),
                cam_right: right.extend(0.0).to_array(),
                cam_up: up.extend(0.0).to_array(),
            }),
        );
        queue.write_buffer(&self.instance_vb, 0, bytemuck::cast_slice(instances));
        self.instance_count = instances.len() as u32;
    }

    pub(crate) fn draw(&self, rpass: &mut wgpu::RenderPass<'_>) {
        if self.instance_count == 0 {
            return;
        }
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
        rpass.set_vertex_buffer(1, self.instance_vb.slice(..));
        rpass.draw(0..6, 0..self.instance_count);
    }
}
