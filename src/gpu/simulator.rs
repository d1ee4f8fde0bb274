//! GPU feedback simulator.
//!
//! Each variable owns three `Rgba32Float` textures of the grid size: the
//! constant base (its seed, never written) and a ping-pong pair. The pair
//! is selected by the simulator-wide generation counter: generation `g`
//! lives in slot `g % 2`. Generation 0 is the seed copy, so retrieving a
//! texture before the first step yields the seed.
//!
//! A step runs every variable's compute pipeline in one pass, reading
//! slot `g % 2` of every dependency and writing slot `(g + 1) % 2` of the
//! variable itself, then bumps the counter. Two bind groups per variable
//! (one per parity) are built at setup, so stepping allocates nothing.

use wgpu::util::DeviceExt;

use crate::computation::Computation;
use crate::error::{GpuError, SetupError};
use crate::program::WORKGROUP_SIZE;
use crate::state_texture::StateTexture;
use crate::uniforms::{ControlParams, SimHeader, UniformValue};

pub(crate) const STATE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

struct VariableGpu {
    name: String,
    _base: wgpu::Texture,
    textures: [wgpu::Texture; 2],
    views: [wgpu::TextureView; 2],
    pipeline: wgpu::ComputePipeline,
    /// Indexed by the parity of the generation being read.
    bind_groups: [wgpu::BindGroup; 2],
}

/// Handle to the most recent output of one variable.
pub struct SimulationTexture<'a> {
    pub texture: &'a wgpu::Texture,
    pub view: &'a wgpu::TextureView,
    /// Ping-pong slot, `generation % 2`.
    pub slot: usize,
    /// Generation the texture holds. 0 is the seed.
    pub generation: u64,
}

/// Runs a [`Computation`] on the GPU.
pub struct FeedbackSimulator {
    size: u32,
    particle_count: u32,
    variables: Vec<VariableGpu>,
    params: ControlParams,
    uniform_buffer: wgpu::Buffer,
    generation: u64,
}

impl FeedbackSimulator {
    /// Validate and compile the computation, then allocate every texture
    /// and pipeline.
    ///
    /// All configuration and program errors surface here, never from
    /// [`step`](Self::step).
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        computation: Computation,
    ) -> Result<Self, SetupError> {
        let shaders = computation.compile()?;

        let size = computation.size();
        let limit = device.limits().max_texture_dimension_2d;
        if size > limit {
            return Err(SetupError::GridTooLarge { size, limit });
        }

        let params = computation.params().clone();
        let header = SimHeader {
            grid_size: size,
            particle_count: computation.particle_count(),
            ..Default::default()
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Simulation Uniform Buffer"),
            contents: &params.to_bytes(&header),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // Textures first: bind groups may reference any variable.
        let mut textures = Vec::with_capacity(computation.variables().len());
        for variable in computation.variables() {
            let bytes = variable.seed().as_bytes();
            let base = create_state_texture(device, queue, size, &format!("{} Base", variable.name()), bytes);
            let slot0 = create_state_texture(device, queue, size, &format!("{} State 0", variable.name()), bytes);
            let slot1 = create_state_texture(device, queue, size, &format!("{} State 1", variable.name()), bytes);
            textures.push((base, [slot0, slot1]));
        }

        let views: Vec<(wgpu::TextureView, [wgpu::TextureView; 2])> = textures
            .iter()
            .map(|(base, slots)| {
                (
                    base.create_view(&wgpu::TextureViewDescriptor::default()),
                    [
                        slots[0].create_view(&wgpu::TextureViewDescriptor::default()),
                        slots[1].create_view(&wgpu::TextureViewDescriptor::default()),
                    ],
                )
            })
            .collect();

        let index_of = |name: &str| {
            computation
                .variables()
                .iter()
                .position(|v| v.name() == name)
                .ok_or_else(|| SetupError::UnknownVariable(name.to_string()))
        };

        let mut variables = Vec::with_capacity(textures.len());
        for (i, (variable, shader)) in computation.variables().iter().zip(&shaders).enumerate() {
            let label = format!("update program '{}'", variable.name());
            let dependency_indices = variable
                .dependencies()
                .iter()
                .map(|d| index_of(d.as_str()))
                .collect::<Result<Vec<_>, _>>()?;

            let layout = create_layout(device, variable.name(), dependency_indices.len());

            device.push_error_scope(wgpu::ErrorFilter::Validation);
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&label),
                source: wgpu::ShaderSource::Wgsl(shader.as_str().into()),
            });
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&label),
                bind_group_layouts: &[&layout],
                push_constant_ranges: &[],
            });
            let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(&label),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            });
            if let Some(err) = pollster::block_on(device.pop_error_scope()) {
                return Err(SetupError::ShaderCompile {
                    label,
                    message: err.to_string(),
                });
            }

            let (base_view, own_views) = &views[i];
            let bind_groups = [0usize, 1].map(|parity| {
                let mut entries = vec![
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&own_views[1 - parity]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(base_view),
                    },
                ];
                for (slot, &dep) in dependency_indices.iter().enumerate() {
                    entries.push(wgpu::BindGroupEntry {
                        binding: 3 + slot as u32,
                        resource: wgpu::BindingResource::TextureView(&views[dep].1[parity]),
                    });
                }
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{} Bind Group {}", variable.name(), parity)),
                    layout: &layout,
                    entries: &entries,
                })
            });

            variables.push((variable.name().to_string(), pipeline, bind_groups));
        }

        let variables = variables
            .into_iter()
            .zip(textures)
            .zip(views)
            .map(|(((name, pipeline, bind_groups), (base, slots)), (_, slot_views))| VariableGpu {
                name,
                _base: base,
                textures: slots,
                views: slot_views,
                pipeline,
                bind_groups,
            })
            .collect::<Vec<_>>();

        log::info!(
            "Feedback simulator ready: {} variable(s) on a {}x{} grid",
            variables.len(),
            size,
            size
        );

        Ok(Self {
            size,
            particle_count: computation.particle_count(),
            variables,
            params,
            uniform_buffer,
            generation: 0,
        })
    }

    /// Advance every variable by exactly one generation.
    ///
    /// The current parameter values are uploaded and the pass is submitted
    /// before returning, so later parameter changes cannot reach back into
    /// this step.
    pub fn step(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, elapsed: f32, delta: f32) {
        let header = SimHeader {
            time: elapsed,
            delta_time: delta,
            grid_size: self.size,
            particle_count: self.particle_count,
        };
        queue.write_buffer(&self.uniform_buffer, 0, &self.params.to_bytes(&header));

        let parity = (self.generation % 2) as usize;
        let groups = self.size.div_ceil(WORKGROUP_SIZE);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Simulation Step Encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Simulation Step"),
                timestamp_writes: None,
            });
            for variable in &self.variables {
                pass.set_pipeline(&variable.pipeline);
                pass.set_bind_group(0, &variable.bind_groups[parity], &[]);
                pass.dispatch_workgroups(groups, groups, 1);
            }
        }
        queue.submit(std::iter::once(encoder.finish()));

        self.generation += 1;
    }

    /// Texture holding the latest generation of `name`.
    pub fn current_texture(&self, name: &str) -> Option<SimulationTexture<'_>> {
        let slot = (self.generation % 2) as usize;
        self.variables.iter().find(|v| v.name == name).map(|v| SimulationTexture {
            texture: &v.textures[slot],
            view: &v.views[slot],
            slot,
            generation: self.generation,
        })
    }

    /// Copy the latest generation of `name` back to the host.
    ///
    /// Blocks until the GPU has finished every submitted step.
    pub fn read_texels(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
    ) -> Result<StateTexture, GpuError> {
        let current = self
            .current_texture(name)
            .ok_or_else(|| GpuError::UnknownVariable(name.to_string()))?;
        super::read_state_texture(device, queue, current.texture, self.size)
    }

    pub fn params(&self) -> &ControlParams {
        &self.params
    }

    /// Live control parameters. Changes take effect at the next step.
    pub fn params_mut(&mut self) -> &mut ControlParams {
        &mut self.params
    }

    /// Set an existing parameter. Unknown names are ignored with a warning,
    /// since the uniform layout is fixed at setup.
    pub fn set_param<V: Into<UniformValue>>(&mut self, name: &str, value: V) {
        if self.params.get(name).is_none() {
            log::warn!("Ignoring unknown simulation parameter '{}'", name);
            return;
        }
        self.params.set(name, value);
    }

    /// Number of completed steps.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|v| v.name.as_str())
    }
}

fn create_state_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    size: u32,
    label: &str,
    data: &[u8],
) -> wgpu::Texture {
    device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: STATE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        data,
    )
}

fn create_layout(device: &wgpu::Device, name: &str, dependency_count: usize) -> wgpu::BindGroupLayout {
    let sampled = |binding: u32| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    };

    let mut entries = vec![
        wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::WriteOnly,
                format: STATE_FORMAT,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            count: None,
        },
        sampled(2),
    ];
    entries.extend((0..dependency_count as u32).map(|i| sampled(3 + i)));

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("{} Layout", name)),
        entries: &entries,
    })
}
