//! Host-side pipeline properties.
//!
//! Everything here runs without a GPU: grid sizing, texel addressing shared
//! by the encoder and the draw attributes, the draw range, seeding and
//! validation of every shipped program.

use mesh_particles::computation::{Computation, Variable};
use mesh_particles::controls::Controls;
use mesh_particles::draw::ParticleGeometry;
use mesh_particles::error::{MeshError, SetupError};
use mesh_particles::grid::{grid_size, texel_uv, uv_to_texel};
use mesh_particles::mesh::{sample_mesh, Geometry, SourceMesh};
use mesh_particles::program::{validate_wgsl, FLOW_FIELD_PROGRAM};
use mesh_particles::setup::ParticleSetup;
use mesh_particles::shader::{BACKDROP_SHADER, PARTICLE_SHADER, SNOW_SHADER};
use mesh_particles::state_texture::StateTexture;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_positions(count: u32, rng: &mut StdRng) -> Vec<f32> {
    (0..count * 3).map(|_| rng.gen_range(-50.0..50.0)).collect()
}

// ============================================================================
// Grid sizing
// ============================================================================

#[test]
fn test_grid_size_bounds_random_counts() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..10_000 {
        let n: u32 = rng.gen_range(1..=50_000_000);
        let s = grid_size(n).unwrap() as u64;
        assert!(s * s >= n as u64);
        assert!((s - 1) * (s - 1) < n as u64);
    }
}

#[test]
fn test_zero_particles_is_a_configuration_error() {
    assert!(matches!(grid_size(0), Err(SetupError::ZeroGrid)));
}

// ============================================================================
// UV / encoder consistency
// ============================================================================

#[test]
fn test_uv_matches_encoded_texel() {
    let mut rng = StdRng::seed_from_u64(9);
    for count in [1u32, 7, 49, 50, 2305, 4096] {
        let size = grid_size(count).unwrap();
        let positions = random_positions(count, &mut rng);
        let seed = StateTexture::encode(&positions, count, size, &mut rng).unwrap();
        let geometry = ParticleGeometry::new(count, size, None, &mut rng);

        for i in 0..count {
            let uv = geometry.uv(i as usize);
            let s = size as f32;
            assert_eq!(uv, [((i % size) as f32 + 0.5) / s, ((i / size) as f32 + 0.5) / s]);
            assert_eq!(uv, texel_uv(i, size));

            // The vertex shader's lookup lands on the texel the encoder wrote
            let (x, y) = uv_to_texel(uv, size);
            let texel = seed.texel((y * size + x) as usize);
            let base = i as usize * 3;
            assert_eq!(&texel[..3], &positions[base..base + 3]);
        }
    }
}

#[test]
fn test_colors_follow_sampling_order() {
    let positions: Vec<[f32; 3]> = (0..10).map(|i| [i as f32, 0.0, 0.0]).collect();
    let colors: Vec<[f32; 3]> = (0..10).map(|i| [i as f32 / 10.0, 0.5, 0.5]).collect();
    let mesh = SourceMesh::new("striped").with_geometry(Geometry::from_positions(positions).with_colors(colors));

    let setup = ParticleSetup::from_mesh(&mesh, &mut StdRng::seed_from_u64(2)).unwrap();
    for (i, instance) in setup.geometry.instances().iter().enumerate() {
        let (x, y) = uv_to_texel(instance.uv, setup.size);
        let texel = setup.seed.texel((y * setup.size + x) as usize);
        // Colour red channel encodes the same index as the position x
        assert_eq!(instance.color[0], texel[0] / 10.0);
        assert_eq!(texel[0], i as f32);
    }
}

// ============================================================================
// Draw range
// ============================================================================

#[test]
fn test_draw_range_excludes_padding() {
    let mut rng = StdRng::seed_from_u64(3);
    for count in [2u32, 10, 2305, 10_001] {
        let size = grid_size(count).unwrap();
        let geometry = ParticleGeometry::new(count, size, None, &mut rng);
        assert_eq!(geometry.draw_range(), 0..count);
        assert_eq!(geometry.instances().len(), count as usize);
    }
}

// ============================================================================
// Seeding
// ============================================================================

#[test]
fn test_seeding_is_idempotent_except_seed_channel() {
    let mut rng = StdRng::seed_from_u64(77);
    let positions = random_positions(500, &mut rng);
    let size = grid_size(500).unwrap();

    let a = StateTexture::encode(&positions, 500, size, &mut StdRng::seed_from_u64(1)).unwrap();
    let b = StateTexture::encode(&positions, 500, size, &mut StdRng::seed_from_u64(2)).unwrap();

    let mut seeds_differ = false;
    for (ta, tb) in a.texels().iter().zip(b.texels()) {
        assert_eq!(&ta[..3], &tb[..3]);
        seeds_differ |= ta[3] != tb[3];
    }
    assert!(seeds_differ);
}

#[test]
fn test_end_to_end_layout_2305() {
    let mesh = SourceMesh::fibonacci_sphere(2305, 15.0);
    let sampled = sample_mesh(&mesh).unwrap();
    assert_eq!(sampled.count, 2305);

    let size = grid_size(sampled.count).unwrap();
    assert_eq!(size, 49);

    let seed = StateTexture::encode(&sampled.positions, sampled.count, size, &mut StdRng::seed_from_u64(0)).unwrap();
    assert_eq!(seed.texels().len(), 2401);
    for i in 0..2305 {
        let texel = seed.texel(i);
        assert_eq!(&texel[..3], &sampled.positions[i * 3..i * 3 + 3]);
        assert!((0.0..1.0).contains(&texel[3]));
    }
    for i in 2305..2401 {
        assert_eq!(seed.texel(i), [0.0; 4]);
    }
}

#[test]
fn test_mesh_without_positions_aborts_setup() {
    let mesh = SourceMesh::new("colours only").with_geometry(Geometry {
        positions: None,
        colors: Some(vec![[1.0; 3]]),
    });
    assert!(matches!(sample_mesh(&mesh), Err(MeshError::MissingPositions)));
}

// ============================================================================
// Program validation
// ============================================================================

#[test]
fn test_shipped_programs_validate() {
    validate_wgsl(PARTICLE_SHADER, "particles").unwrap();
    validate_wgsl(SNOW_SHADER, "snow").unwrap();
    validate_wgsl(BACKDROP_SHADER, "backdrop").unwrap();

    let setup = ParticleSetup::from_mesh(&SourceMesh::fibonacci_sphere(100, 1.0), &mut StdRng::seed_from_u64(0)).unwrap();
    let computation = setup.computation(FLOW_FIELD_PROGRAM, &Controls::default()).unwrap();
    computation.compile().unwrap();
}

#[test]
fn test_multi_variable_program_validates() {
    let size = 4;
    let mut computation = Computation::new(size, 16).with_param("strength", 1.0f32);
    computation
        .add_variable(
            Variable::new(
                "velocity",
                r#"
fn update(coord: vec2<i32>, uv: vec2<f32>) -> vec4<f32> {
    let left = read_positions(coord - vec2<i32>(1, 0));
    let right = read_positions(coord + vec2<i32>(1, 0));
    return vec4<f32>((right.xyz - left.xyz) * params.strength, 0.0);
}
"#,
                StateTexture::zeroed(size),
            )
            .with_dependencies(["positions"]),
        )
        .unwrap();
    computation
        .add_variable(
            Variable::new(
                "positions",
                r#"
fn update(coord: vec2<i32>, uv: vec2<f32>) -> vec4<f32> {
    let p = read_positions(coord);
    let v = read_velocity(coord);
    return vec4<f32>(p.xyz + v.xyz * params.delta_time, p.w);
}
"#,
                StateTexture::zeroed(size),
            )
            .with_dependencies(["positions", "velocity"])
            .lock_seed_channel(),
        )
        .unwrap();

    assert_eq!(computation.compile().unwrap().len(), 2);
}
