//! Body meshes. Topology (indices) is uploaded once; positions and normals
//! are rewritten whenever the displayed frame changes.

use super::helpers;
use crate::constants::*;
use glam::Mat4;
use groove_core::{vertex_normals, MeshFrame, Topology, MESH_WGSL};
use wgpu::util::DeviceExt;

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const NORMAL_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniforms {
    view_proj: [[f32; 4]; 4],
    key_light: [f32; 4],
    fill_light: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialUniforms {
    color: [f32; 4],
}

struct PersonBuffers {
    positions: wgpu::Buffer,
    normals: wgpu::Buffer,
    material: wgpu::BindGroup,
    visible: bool,
}

pub(crate) struct MeshResources {
    pipeline: wgpu::RenderPipeline,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
    indices: Vec<u32>,
    people: Vec<PersonBuffers>,
    scratch: Vec<f32>,
}

pub(crate) fn create_mesh_resources(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
) -> MeshResources {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("mesh_shader"),
        source: wgpu::ShaderSource::Wgsl(MESH_WGSL.into()),
    });
    let scene_buffer =
        helpers::uniform_buffer(device, "mesh_scene", std::mem::size_of::<SceneUniforms>());
    let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("mesh_scene_bgl"),
        entries: &[helpers::uniform_layout_entry(0)],
    });
    let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("mesh_material_bgl"),
        entries: &[helpers::uniform_layout_entry(0)],
    });
    let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("mesh_scene_bg"),
        layout: &scene_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: scene_buffer.as_entire_binding(),
        }],
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("mesh_pl"),
        bind_group_layouts: &[&scene_layout, &material_layout],
        push_constant_ranges: &[],
    });
    let vec3_layout = |attributes: &'static [wgpu::VertexAttribute]| wgpu::VertexBufferLayout {
        array_stride: (std::mem::size_of::<f32>() * 3) as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    };
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("mesh_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[vec3_layout(&POSITION_ATTRS), vec3_layout(&NORMAL_ATTRS)],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: helpers::DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        cache: None,
        multiview: None,
    });

    MeshResources {
        pipeline,
        scene_buffer,
        scene_bind_group,
        material_layout,
        index_buffer: None,
        index_count: 0,
        indices: Vec::new(),
        people: Vec::new(),
        scratch: Vec::new(),
    }
}

impl MeshResources {
    /// Upload the shared index buffer and allocate per-person vertex buffers.
    pub(crate) fn set_topology(&mut self, device: &wgpu::Device, topology: &Topology) {
        self.indices = topology.indices();
        self.index_count = self.indices.len() as u32;
        self.index_buffer = (!self.indices.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_indices"),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });
        let bytes = (topology.num_vertices * 3 * std::mem::size_of::<f32>()).max(4) as u64;
        let vertex_buffer = |label: &str| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: bytes,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        self.people = MESH_COLORS
            .iter()
            .map(|color| {
                let material = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("mesh_material"),
                    contents: bytemuck::bytes_of(&MaterialUniforms { color: *color }),
                    usage: wgpu::BufferUsages::UNIFORM,
                });
                PersonBuffers {
                    positions: vertex_buffer("mesh_positions"),
                    normals: vertex_buffer("mesh_normals"),
                    material: device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some("mesh_material_bg"),
                        layout: &self.material_layout,
                        entries: &[wgpu::BindGroupEntry {
                            binding: 0,
                            resource: material.as_entire_binding(),
                        }],
                    }),
                    visible: false,
                }
            })
            .collect();
        self.scratch = vec![0.0; topology.num_vertices * 3];
    }

    /// Rewrite vertex buffers for `frame`. People beyond the allocated
    /// slots, or whose vertex count does not match, are skipped.
    pub(crate) fn set_frame(
        &mut self,
        queue: &wgpu::Queue,
        frame: Option<&MeshFrame>,
        topology: &Topology,
    ) {
        for person in self.people.iter_mut() {
            person.visible = false;
        }
        let Some(frame) = frame else {
            return;
        };
        for (slot, person) in self.people.iter_mut().zip(frame.iter()) {
            if let Err(e) = person.write_positions(topology, &mut self.scratch) {
                log::warn!("[mesh] {}", e);
                continue;
            }
            let normals = vertex_normals(&self.scratch, &self.indices);
            queue.write_buffer(&slot.positions, 0, bytemuck::cast_slice(&self.scratch));
            queue.write_buffer(&slot.normals, 0, bytemuck::cast_slice(&normals));
            slot.visible = true;
        }
    }

    pub(crate) fn update_scene(&self, queue: &wgpu::Queue, view_proj: Mat4) {
        queue.write_buffer(
            &self.scene_buffer,
            0,
            bytemuck::bytes_of(&SceneUniforms {
                view_proj: view_proj.to_cols_array_2d(),
                key_light: KEY_LIGHT,
                fill_light: FILL_LIGHT,
            }),
        );
    }

    pub(crate) fn draw(&self, rpass: &mut wgpu::RenderPass<'_>) {
        let Some(index_buffer) = &self.index_buffer else {
            return;
        };
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.scene_bind_group, &[]);
        rpass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        for person in self.people.iter().filter(|p| p.visible) {
            rpass.set_bind_group(1, &person.material, &[]);
            rpass.set_vertex_buffer(0, person.positions.slice(..));
            rpass.set_vertex_buffer(1, person.normals.slice(..));
            rpass.draw_indexed(0..self.index_count, 0, 0..1);
        }
    }
}
