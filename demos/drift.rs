//! # Drift Demo
//!
//! A custom update program on a procedural sphere: every particle orbits
//! the vertical axis and bobs with its own phase, taken from the seed
//! channel. `strength` scales the orbit speed, `frequency` the bob rate
//! and `influence` its height.
//!
//! Run with: `cargo run --example drift`

use mesh_particles::prelude::*;

const DRIFT: &str = r#"
const TAU: f32 = 6.2831853;

fn update(coord: vec2<i32>, uv: vec2<f32>) -> vec4<f32> {
    let p = read_particles(coord);
    let origin = read_base(coord);

    let angle = params.delta_time * params.strength * 0.1;
    let c = cos(angle);
    let s = sin(angle);
    let spun = vec3<f32>(p.x * c - p.z * s, p.y, p.x * s + p.z * c);

    let bob = sin(params.time * params.frequency * TAU + origin.w * TAU) * params.influence;
    return vec4<f32>(spun.x, origin.y + bob, spun.z, p.w);
}
"#;

fn main() -> Result<(), ExperienceError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let preset = ModelPreset {
        name: "Drift".into(),
        clear_color: "#10131c".into(),
        influence: 1.5,
        strength: 2.0,
        frequency: 0.25,
        ..ModelPreset::default()
    };

    Experience::new()
        .with_title("Drift")
        .with_preset(preset)
        .with_mesh(SourceMesh::fibonacci_sphere(30_000, 15.0))
        .with_program(DRIFT)
        .run()
}
