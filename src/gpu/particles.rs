//! Particle point renderer.
//!
//! The simulation texture is bound in its own group (1) so it can be
//! swapped every frame without touching the uniforms. One group is built
//! per ping-pong slot the first time that slot is bound, so a renderer
//! stays tied to the simulator it was first bound to.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::draw::{ParticleGeometry, ParticleInstance};
use crate::shader::PARTICLE_SHADER;

use super::simulator::SimulationTexture;
use super::DEPTH_FORMAT;

/// Uniform block of the particle program.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct DrawUniforms {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub resolution: [f32; 2],
    /// Global point size multiplier.
    pub size: f32,
    pub time: f32,
    pub grid_size: u32,
    pub _padding: [u32; 3],
}

impl DrawUniforms {
    pub fn new(grid_size: u32, size: f32) -> Self {
        Self {
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            view: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            resolution: [1.0, 1.0],
            size,
            time: 0.0,
            grid_size,
            _padding: [0; 3],
        }
    }
}

pub struct ParticleRenderer {
    pipeline: wgpu::RenderPipeline,
    instance_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    /// Indexed by simulator slot.
    slot_bind_groups: [Option<wgpu::BindGroup>; 2],
    bound: Option<(usize, u64)>,
    draw_range: std::ops::Range<u32>,
    pub uniforms: DrawUniforms,
}

impl ParticleRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        geometry: &ParticleGeometry,
        point_size: f32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(PARTICLE_SHADER.into()),
        });

        let uniforms = DrawUniforms::new(geometry.grid_size(), point_size);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Instance Buffer"),
            contents: bytemuck::cast_slice(geometry.instances()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle State Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Particle Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[ParticleInstance::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            instance_buffer,
            uniform_buffer,
            uniform_bind_group,
            texture_layout,
            slot_bind_groups: [None, None],
            bound: None,
            draw_range: geometry.draw_range(),
            uniforms,
        }
    }

    /// Bind the simulator's current output for the next draw.
    ///
    /// Must run after the step and before [`draw`](Self::draw) every frame.
    pub fn bind_simulation_texture(&mut self, device: &wgpu::Device, texture: &SimulationTexture<'_>) {
        let layout = &self.texture_layout;
        self.slot_bind_groups[texture.slot].get_or_insert_with(|| {
            log::debug!("Creating particle state bind group for slot {}", texture.slot);
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Particle State Bind Group"),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(texture.view),
                }],
            })
        });
        self.bound = Some((texture.slot, texture.generation));
    }

    /// Generation of the texture currently bound, if any.
    pub fn bound_generation(&self) -> Option<u64> {
        self.bound.map(|(_, generation)| generation)
    }

    /// Simulator slot the next draw reads from.
    pub fn bound_slot(&self) -> Option<usize> {
        self.bound.map(|(slot, _)| slot)
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.uniforms.resolution = [width as f32, height as f32];
    }

    pub fn set_matrices(&mut self, projection: Mat4, view: Mat4, model: Mat4) {
        self.uniforms.projection = projection.to_cols_array_2d();
        self.uniforms.view = view.to_cols_array_2d();
        self.uniforms.model = model.to_cols_array_2d();
    }

    pub fn upload(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
    }

    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        let Some(texture_bind_group) = self.bound.and_then(|(slot, _)| self.slot_bind_groups[slot].as_ref()) else {
            log::warn!("Particle draw skipped: no simulation texture bound");
            return;
        };
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        render_pass.set_bind_group(1, texture_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        render_pass.draw(0..6, self.draw_range.clone());
    }
}
