//! # mesh-particles
//!
//! Turns a triangle mesh into a cloud of GPU-simulated particles, one per
//! vertex, drifting through a noise flow field above a host-simulated
//! snowfall.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mesh_particles::prelude::*;
//!
//! fn main() -> Result<(), ExperienceError> {
//!     Experience::new()
//!         .with_model_path("polar_bear.glb")
//!         .run()
//! }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! SourceMesh --sample_mesh--> SampledMesh --encode--> StateTexture
//!     --FeedbackSimulator (ping-pong, every frame)--> current texture
//!     --ParticleRenderer (rebinds every frame)--> screen
//! ```
//!
//! - Particle `i` lives in texel `(i % S, i / S)` of an `S x S` grid,
//!   `S = ceil(sqrt(N))`. Texels `N..S*S` are padding and never drawn.
//! - Each texel holds `(x, y, z, seed)`. The seed is fixed at encode time.
//! - The draw side carries a per-instance UV pointing at the particle's
//!   texel, built in the same order as the encoder.
//! - [`FrameDriver`](frame::FrameDriver) sequences host update, simulation
//!   step, texture rebind and draw every tick once the user has entered.
//!
//! ## Custom Programs
//!
//! The simulator runs any WGSL update program following the contract in
//! [`program`]. Programs are validated with naga when the simulator is
//! built, so a broken program fails setup instead of the first frame.
//!
//! ```ignore
//! let program = r#"
//! fn update(coord: vec2<i32>, uv: vec2<f32>) -> vec4<f32> {
//!     let p = read_particles(coord);
//!     return vec4<f32>(p.xyz + vec3<f32>(0.0, params.delta_time * params.strength, 0.0), p.w);
//! }
//! "#;
//! Experience::new().with_program(program).run()?;
//! ```

pub mod computation;
pub mod controls;
pub mod draw;
pub mod error;
pub mod experience;
pub mod frame;
pub mod gpu;
pub mod grid;
pub mod loader;
pub mod mesh;
pub mod preset;
pub mod program;
pub mod setup;
pub mod shader;
pub mod shader_utils;
pub mod snow;
pub mod state_texture;
pub mod time;
pub mod uniforms;

pub use glam::{Vec2, Vec3, Vec4};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use mesh_particles::prelude::*;
/// ```
pub mod prelude {
    pub use crate::computation::{Computation, Variable};
    pub use crate::controls::Controls;
    pub use crate::draw::ParticleGeometry;
    pub use crate::error::{ExperienceError, GpuError, MeshError, PresetError, SetupError};
    pub use crate::experience::Experience;
    pub use crate::frame::{FrameDriver, FrameStage, FrameState};
    pub use crate::gpu::{FeedbackSimulator, GpuContext};
    pub use crate::grid::{grid_size, texel_uv};
    pub use crate::loader::load_gltf;
    pub use crate::mesh::{sample_mesh, Geometry, SampledMesh, SourceMesh};
    pub use crate::preset::ModelPreset;
    pub use crate::program::FLOW_FIELD_PROGRAM;
    pub use crate::setup::ParticleSetup;
    pub use crate::snow::{SnowConfig, SnowField};
    pub use crate::state_texture::StateTexture;
    pub use crate::time::Clock;
    pub use crate::uniforms::ControlParams;
    pub use crate::{Vec2, Vec3, Vec4};
    #[cfg(feature = "egui")]
    pub use egui;
}
