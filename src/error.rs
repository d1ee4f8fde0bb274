//! Error types for mesh-particles.
//!
//! Every failure here is a setup-time failure: once the frame loop is
//! running there is no error channel, so anything that can go wrong must be
//! caught before the session leaves the idle state.

use thiserror::Error;

/// Errors raised while turning an asset into particle data.
#[derive(Debug, Error)]
pub enum MeshError {
    /// The mesh has no geometry at all.
    #[error("mesh contains no geometry")]
    NoGeometry,
    /// The first geometry carries no vertex position attribute.
    #[error("first geometry has no vertex position data")]
    MissingPositions,
    /// The position attribute exists but holds zero vertices.
    #[error("first geometry has an empty position attribute")]
    Empty,
    /// The glTF importer rejected the file.
    #[error("failed to import glTF asset: {0}")]
    Gltf(#[from] gltf::Error),
}

/// Configuration errors in the simulation or draw setup.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The particle count produced a zero-sized simulation grid.
    #[error("simulation grid size must be positive (particle count was 0)")]
    ZeroGrid,
    /// The grid does not fit in a single texture on this device.
    #[error("simulation grid {size}x{size} exceeds the device texture limit of {limit}")]
    GridTooLarge { size: u32, limit: u32 },
    /// More particles than texels.
    #[error("{count} particles do not fit in a {size}x{size} grid")]
    Capacity { count: u32, size: u32 },
    /// The position array is shorter than `3 * count`.
    #[error("position array holds {available} floats, need {needed}")]
    ShortPositions { available: usize, needed: usize },
    /// Computation has nothing to run.
    #[error("computation has no variables")]
    NoVariables,
    /// A variable name was registered twice.
    #[error("variable '{0}' is registered twice")]
    DuplicateVariable(String),
    /// A lookup named a variable that does not exist.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    /// A dependency list references a variable that was never registered.
    #[error("variable '{variable}' depends on unregistered variable '{dependency}'")]
    UnknownDependency { variable: String, dependency: String },
    /// A variable or parameter name cannot be used as a WGSL identifier.
    #[error("'{0}' is not a usable shader identifier")]
    InvalidName(String),
    /// The seed texture of a variable has the wrong dimensions.
    #[error("seed texture for '{variable}' is {actual}x{actual}, expected {expected}x{expected}")]
    SeedSize {
        variable: String,
        actual: u32,
        expected: u32,
    },
    /// A program failed to parse, validate or build into a pipeline.
    #[error("{label} failed to compile:\n{message}")]
    ShaderCompile { label: String, message: String },
}

/// Errors that can occur during GPU initialization and readback.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; a Vulkan, Metal, DX12 or GL capable device is required")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reports no usable format.
    #[error("surface is not supported by the selected adapter")]
    UnsupportedSurface,
    /// Failed to map buffer for reading.
    #[error("failed to map GPU buffer: {0}")]
    BufferMapping(String),
    /// Readback requested for a variable the simulator does not own.
    #[error("no simulation variable named '{0}'")]
    UnknownVariable(String),
}

/// Errors loading a model preset.
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("failed to read preset: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse preset: {0}")]
    Json(#[from] serde_json::Error),
    #[error("'{0}' is not a #rrggbb colour")]
    Color(String),
}

/// Errors that stop an interactive session from starting.
#[derive(Debug, Error)]
pub enum ExperienceError {
    /// Failed to create event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Preset(#[from] PresetError),
}
