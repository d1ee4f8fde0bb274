//! GPU resources: device setup, the feedback simulator and the renderers.

mod backdrop;
pub mod camera;
#[cfg(feature = "egui")]
pub mod egui_integration;
mod particles;
mod simulator;
mod snow;

use std::sync::Arc;

use winit::window::Window;

use crate::error::GpuError;
use crate::state_texture::StateTexture;

pub use backdrop::BackdropRenderer;
pub use camera::OrbitCamera;
pub use particles::{DrawUniforms, ParticleRenderer};
pub use simulator::{FeedbackSimulator, SimulationTexture};
pub use snow::SnowRenderer;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Adapter, device and queue shared by every GPU component.
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Context without a surface, for tests and offline stepping.
    pub async fn headless() -> Result<Self, GpuError> {
        let instance = create_instance();
        Self::with_instance(instance, None).await
    }

    /// Context plus a configured surface for `window`.
    pub async fn for_window(
        window: Arc<Window>,
    ) -> Result<(Self, wgpu::Surface<'static>, wgpu::SurfaceConfiguration), GpuError> {
        let size = window.inner_size();
        let instance = create_instance();
        let surface = instance.create_surface(window)?;
        let context = Self::with_instance(instance, Some(&surface)).await?;

        let surface_caps = surface.get_capabilities(&context.adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&context.device, &config);

        Ok((context, surface, config))
    }

    async fn with_instance(
        instance: wgpu::Instance,
        surface: Option<&wgpu::Surface<'_>>,
    ) -> Result<Self, GpuError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }
}

fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    })
}

pub(crate) fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Blocking copy of a square `Rgba32Float` texture to the host.
pub(crate) fn read_state_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    size: u32,
) -> Result<StateTexture, GpuError> {
    let unpadded_row = size * 16;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    // Must be aligned to COPY_BYTES_PER_ROW_ALIGNMENT (256)
    let padded_row = unpadded_row.div_ceil(align) * align;

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("State Readback Buffer"),
        size: padded_row as u64 * size as u64,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("State Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: Some(size),
            },
        },
        wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let buffer_slice = staging.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    receiver
        .recv()
        .map_err(|e| GpuError::BufferMapping(e.to_string()))?
        .map_err(|e| GpuError::BufferMapping(e.to_string()))?;

    let mut texels = Vec::with_capacity(size as usize * size as usize);
    {
        let data = buffer_slice.get_mapped_range();
        for row in data.chunks_exact(padded_row as usize) {
            texels.extend(
                row[..unpadded_row as usize]
                    .chunks_exact(16)
                    .map(bytemuck::pod_read_unaligned::<[f32; 4]>),
            );
        }
    }
    staging.unmap();

    StateTexture::from_texels(size, texels)
        .ok_or_else(|| GpuError::BufferMapping("readback returned a short image".to_string()))
}
