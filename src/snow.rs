//! Host-side snow.
//!
//! An independent particle field integrated on the CPU every tick and
//! uploaded as instance data. It has no feedback dependency and never
//! touches the simulation textures.

use bytemuck::{Pod, Zeroable};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Half the box width is `range / 2` on x and z.
const RANGE: f32 = 300.0;
const MIN_HEIGHT: f32 = 30.0;
/// Height band above `MIN_HEIGHT` that flakes spawn into.
const SPAWN_BAND: f32 = RANGE / 2.0;

/// Snow settings, part of a model preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowConfig {
    pub enabled: bool,
    /// Downward distance per 60 Hz frame.
    pub speed: f32,
    pub size: f32,
    pub count: u32,
}

impl Default for SnowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            speed: 0.2,
            size: 1.0,
            count: 20_000,
        }
    }
}

/// Per-flake instance record.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SnowInstance {
    pub position: [f32; 3],
    pub scale: f32,
    pub randomness: f32,
}

impl SnowInstance {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32, 2 => Float32];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Falling flakes in a `300 x 300` box.
pub struct SnowField {
    instances: Vec<SnowInstance>,
    velocities: Vec<[f32; 3]>,
    speed: f32,
    size: f32,
    pub enabled: bool,
}

impl SnowField {
    pub fn new<R: Rng + ?Sized>(config: &SnowConfig, rng: &mut R) -> Self {
        let count = config.count as usize;
        let mut instances = Vec::with_capacity(count);
        let mut velocities = Vec::with_capacity(count);

        for _ in 0..count {
            instances.push(SnowInstance {
                position: spawn_position(rng),
                scale: rng.gen::<f32>() * 2.0,
                randomness: rng.gen::<f32>(),
            });
            velocities.push([
                (rng.gen::<f32>() - 0.5) * 0.2,
                -(rng.gen::<f32>() * 0.5 + 0.5) * 0.2,
                (rng.gen::<f32>() - 0.5) * 0.2,
            ]);
        }

        log::debug!("Spawned {} snow flakes", count);

        Self {
            instances,
            velocities,
            speed: config.speed,
            size: config.size,
            enabled: config.enabled,
        }
    }

    /// Integrate by `delta` seconds. Flakes below the ground respawn at a
    /// random position in the spawn band.
    pub fn update<R: Rng + ?Sized>(&mut self, delta: f32, rng: &mut R) {
        let frames = delta * 60.0;
        for (flake, velocity) in self.instances.iter_mut().zip(&self.velocities) {
            flake.position[0] += velocity[0] * frames;
            flake.position[1] += velocity[1] * frames;
            flake.position[2] += velocity[2] * frames;

            if flake.position[1] < 0.0 {
                flake.position = spawn_position(rng);
            }
        }
    }

    /// Set every flake's downward velocity.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
        for velocity in &mut self.velocities {
            velocity[1] = -speed;
        }
    }

    /// Set every flake's scale.
    pub fn set_size(&mut self, size: f32) {
        self.size = size;
        for flake in &mut self.instances {
            flake.scale = size;
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn instances(&self) -> &[SnowInstance] {
        &self.instances
    }

    pub fn velocities(&self) -> &[[f32; 3]] {
        &self.velocities
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

fn spawn_position<R: Rng + ?Sized>(rng: &mut R) -> [f32; 3] {
    [
        (rng.gen::<f32>() - 0.5) * RANGE,
        MIN_HEIGHT + rng.gen::<f32>() * SPAWN_BAND,
        (rng.gen::<f32>() - 0.5) * RANGE,
    ]
}
