//! Gradient backdrop drawn behind everything else.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::shader::BACKDROP_SHADER;

use super::DEPTH_FORMAT;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct BackdropUniforms {
    inverse_view_proj: [[f32; 4]; 4],
    horizon: [f32; 4],
    zenith: [f32; 4],
    ground: [f32; 4],
}

/// Horizon, zenith and ground colours derived from one base colour.
///
/// The base is the horizon; the sky lightens towards a pale blue and the
/// ground darkens.
pub fn gradient_from(base: Vec3) -> [Vec3; 3] {
    let zenith = base.lerp(Vec3::new(0.55, 0.68, 0.78), 0.6);
    let ground = base * 0.35;
    [base, zenith, ground]
}

pub struct BackdropRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    colors: [Vec3; 3],
}

impl BackdropRenderer {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, base: Vec3) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Backdrop Shader"),
            source: wgpu::ShaderSource::Wgsl(BACKDROP_SHADER.into()),
        });

        let colors = gradient_from(base);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Backdrop Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms(Mat4::IDENTITY, colors)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Backdrop Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Backdrop Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Backdrop Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Backdrop Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
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
            primitive: wgpu::PrimitiveState::default(),
            // Never occludes: no depth write, always passes
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
            colors,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, view: Mat4, projection: Mat4) {
        let inverse = (projection * view).inverse();
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms(inverse, self.colors)));
    }

    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

fn uniforms(inverse_view_proj: Mat4, colors: [Vec3; 3]) -> BackdropUniforms {
    BackdropUniforms {
        inverse_view_proj: inverse_view_proj.to_cols_array_2d(),
        horizon: colors[0].extend(1.0).to_array(),
        zenith: colors[1].extend(1.0).to_array(),
        ground: colors[2].extend(1.0).to_array(),
    }
}
