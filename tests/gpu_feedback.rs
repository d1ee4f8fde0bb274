//! Feedback simulator on a real device.
//!
//! Each test requests a headless adapter and returns early, logging why,
//! when none is available.

use mesh_particles::computation::{Computation, Variable};
use mesh_particles::error::SetupError;
use mesh_particles::draw::ParticleGeometry;
use mesh_particles::gpu::{FeedbackSimulator, GpuContext, ParticleRenderer};
use mesh_particles::grid::grid_size;
use mesh_particles::program::FLOW_FIELD_PROGRAM;
use mesh_particles::state_texture::StateTexture;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DRIFT_PROGRAM: &str = r#"
fn update(coord: vec2<i32>, uv: vec2<f32>) -> vec4<f32> {
    let p = read_particles(coord);
    return vec4<f32>(p.xyz + vec3<f32>(params.delta_time * params.strength), p.w);
}
"#;

fn gpu() -> Option<GpuContext> {
    match pollster::block_on(GpuContext::headless()) {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            eprintln!("skipping GPU test: {err}");
            None
        }
    }
}

fn seeded(count: u32) -> (u32, StateTexture) {
    let size = grid_size(count).unwrap();
    let mut rng = StdRng::seed_from_u64(2305);
    let positions: Vec<f32> = (0..count * 3).map(|_| rng.gen_range(-20.0..20.0)).collect();
    let seed = StateTexture::encode(&positions, count, size, &mut rng).unwrap();
    (size, seed)
}

fn drift(count: u32, strength: f32) -> (Computation, StateTexture) {
    let (size, seed) = seeded(count);
    let mut computation = Computation::new(size, count).with_param("strength", strength);
    computation
        .add_variable(
            Variable::new("particles", DRIFT_PROGRAM, seed.clone())
                .with_dependencies(["particles"])
                .lock_seed_channel(),
        )
        .unwrap();
    (computation, seed)
}

fn assert_shifted(before: &StateTexture, after: &StateTexture, count: usize, shift: f32) {
    for i in 0..count {
        let (a, b) = (before.texel(i), after.texel(i));
        for c in 0..3 {
            assert!(
                (b[c] - a[c] - shift).abs() < 1e-4,
                "texel {i} channel {c}: {} -> {}, expected shift {shift}",
                a[c],
                b[c]
            );
        }
        assert_eq!(a[3], b[3], "seed of texel {i} changed");
    }
}

#[test]
fn test_retrieve_before_step_returns_seed() {
    let Some(gpu) = gpu() else { return };
    let (computation, seed) = drift(100, 4.0);
    let simulator = FeedbackSimulator::new(&gpu.device, &gpu.queue, computation).unwrap();

    assert_eq!(simulator.generation(), 0);
    assert_eq!(simulator.current_texture("particles").unwrap().generation, 0);
    let texels = simulator.read_texels(&gpu.device, &gpu.queue, "particles").unwrap();
    assert_eq!(texels, seed);
}

#[test]
fn test_one_step_2305_particles() {
    let Some(gpu) = gpu() else { return };
    let strength = 4.0;
    let (computation, seed) = drift(2305, strength);
    let mut simulator = FeedbackSimulator::new(&gpu.device, &gpu.queue, computation).unwrap();
    assert_eq!(simulator.size(), 49);

    simulator.step(&gpu.device, &gpu.queue, 0.016, 0.016);
    let after = simulator.read_texels(&gpu.device, &gpu.queue, "particles").unwrap();

    assert_shifted(&seed, &after, 2305, 0.016 * strength);
    for i in 2305..2401 {
        assert_eq!(after.texel(i), [0.0; 4], "padding texel {i} was written");
    }
}

#[test]
fn test_strength_change_applies_to_next_step_only() {
    let Some(gpu) = gpu() else { return };
    let (computation, seed) = drift(500, 1.0);
    let mut simulator = FeedbackSimulator::new(&gpu.device, &gpu.queue, computation).unwrap();

    simulator.step(&gpu.device, &gpu.queue, 0.016, 0.016);
    simulator.set_param("strength", 3.0f32);
    let first = simulator.read_texels(&gpu.device, &gpu.queue, "particles").unwrap();
    assert_shifted(&seed, &first, 500, 0.016);

    simulator.step(&gpu.device, &gpu.queue, 0.032, 0.016);
    let second = simulator.read_texels(&gpu.device, &gpu.queue, "particles").unwrap();
    assert_shifted(&first, &second, 500, 0.048);
}

#[test]
fn test_ping_pong_alternates_slots() {
    let Some(gpu) = gpu() else { return };
    let (computation, _) = drift(64, 1.0);
    let mut simulator = FeedbackSimulator::new(&gpu.device, &gpu.queue, computation).unwrap();

    let mut previous = None;
    for generation in 1..=4u64 {
        simulator.step(&gpu.device, &gpu.queue, generation as f32 * 0.01, 0.01);
        let current = simulator.current_texture("particles").unwrap();
        assert_eq!(current.generation, generation);
        assert_eq!(current.slot, (generation % 2) as usize);
        let slot = current.texture as *const wgpu::Texture;
        assert_ne!(Some(slot), previous);
        previous = Some(slot);
    }
}

#[test]
fn test_renderer_tracks_current_generation() {
    let Some(gpu) = gpu() else { return };
    let (computation, _) = drift(300, 1.0);
    let mut simulator = FeedbackSimulator::new(&gpu.device, &gpu.queue, computation).unwrap();
    let geometry = ParticleGeometry::new(300, simulator.size(), None, &mut StdRng::seed_from_u64(5));
    let mut renderer = ParticleRenderer::new(&gpu.device, wgpu::TextureFormat::Rgba8UnormSrgb, &geometry, 0.4);
    assert_eq!(renderer.bound_generation(), None);

    let seed = simulator.current_texture("particles").unwrap();
    renderer.bind_simulation_texture(&gpu.device, &seed);
    assert_eq!(renderer.bound_generation(), Some(0));
    assert_eq!(renderer.bound_slot(), Some(0));

    for frame in 1..=5u64 {
        simulator.step(&gpu.device, &gpu.queue, frame as f32 * 0.016, 0.016);
        let current = simulator.current_texture("particles").unwrap();
        renderer.bind_simulation_texture(&gpu.device, &current);

        assert_eq!(renderer.bound_generation(), Some(simulator.generation()));
        assert_eq!(renderer.bound_slot(), Some((frame % 2) as usize));
    }
}

#[test]
fn test_flow_program_keeps_seed_channel() {
    let Some(gpu) = gpu() else { return };
    let (size, seed) = seeded(1000);
    let mut computation = Computation::new(size, 1000)
        .with_param("influence", 0.5f32)
        .with_param("strength", 4.0f32)
        .with_param("frequency", 0.5f32);
    computation
        .add_variable(
            Variable::new("particles", FLOW_FIELD_PROGRAM, seed.clone())
                .with_dependencies(["particles"])
                .lock_seed_channel(),
        )
        .unwrap();
    let mut simulator = FeedbackSimulator::new(&gpu.device, &gpu.queue, computation).unwrap();

    for frame in 1..=30 {
        simulator.step(&gpu.device, &gpu.queue, frame as f32 / 60.0, 1.0 / 60.0);
    }
    let after = simulator.read_texels(&gpu.device, &gpu.queue, "particles").unwrap();
    for i in 0..1000 {
        assert_eq!(after.texel(i)[3], seed.texel(i)[3]);
        assert!(after.texel(i)[..3].iter().all(|v| v.is_finite()));
    }
}

#[test]
fn test_configuration_errors_fail_at_setup() {
    let Some(gpu) = gpu() else { return };

    let (mut computation, _) = drift(16, 1.0);
    computation.set_dependencies("particles", ["velocity"]).unwrap();
    let result = FeedbackSimulator::new(&gpu.device, &gpu.queue, computation);
    assert!(matches!(result, Err(SetupError::UnknownDependency { .. })));

    let (size, seed) = seeded(16);
    let mut broken = Computation::new(size, 16);
    broken
        .add_variable(Variable::new("particles", "fn update() {}", seed))
        .unwrap();
    let result = FeedbackSimulator::new(&gpu.device, &gpu.queue, broken);
    assert!(matches!(result, Err(SetupError::ShaderCompile { .. })));
}
