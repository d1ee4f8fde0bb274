//! Fixed render programs.
//!
//! Update programs are composed at setup (see [`crate::program`]); these are
//! used as-is.

/// Camera-facing particle quads positioned from the simulation texture.
pub const PARTICLE_SHADER: &str = include_str!("shaders/particles.wgsl");

/// Additive snow flakes.
pub const SNOW_SHADER: &str = include_str!("shaders/snow.wgsl");

/// Fullscreen gradient behind the scene.
pub const BACKDROP_SHADER: &str = include_str!("shaders/backdrop.wgsl");
