//! Host-side particle setup.
//!
//! Everything that happens once, before any GPU work: sample the mesh,
//! size the grid, encode the seed texture, build the draw attributes and
//! describe the computation. Runs identically with or without a device,
//! which is what lets the pipeline be checked offline.

use rand::Rng;

use crate::computation::{Computation, Variable};
use crate::controls::Controls;
use crate::draw::ParticleGeometry;
use crate::error::{ExperienceError, SetupError};
use crate::grid::grid_size;
use crate::mesh::{sample_mesh, SampledMesh, SourceMesh};
use crate::state_texture::StateTexture;

/// Name of the simulated particle variable.
pub const PARTICLE_VARIABLE: &str = "particles";

pub struct ParticleSetup {
    pub sampled: SampledMesh,
    pub size: u32,
    pub seed: StateTexture,
    pub geometry: ParticleGeometry,
}

impl ParticleSetup {
    /// Sample `mesh` and build every derived array.
    ///
    /// `rng` supplies both the seed channel and the per-particle sizes.
    pub fn from_mesh<R: Rng + ?Sized>(mesh: &SourceMesh, rng: &mut R) -> Result<Self, ExperienceError> {
        let sampled = sample_mesh(mesh)?;
        let size = grid_size(sampled.count)?;
        let seed = StateTexture::encode(&sampled.positions, sampled.count, size, rng)?;
        let geometry = ParticleGeometry::new(sampled.count, size, sampled.colors.as_deref(), rng);

        log::info!(
            "{} particles on a {}x{} grid ({} padding texels)",
            sampled.count,
            size,
            size,
            size as u64 * size as u64 - sampled.count as u64
        );

        Ok(Self {
            sampled,
            size,
            seed,
            geometry,
        })
    }

    pub fn particle_count(&self) -> u32 {
        self.sampled.count
    }

    /// Single self-dependent particle variable running `program`, with the
    /// tunables from `controls` as parameters. The seed channel is locked.
    pub fn computation(&self, program: &str, controls: &Controls) -> Result<Computation, SetupError> {
        let mut computation = Computation::new(self.size, self.sampled.count)
            .with_param("influence", controls.influence)
            .with_param("strength", controls.strength)
            .with_param("frequency", controls.frequency);
        computation.add_variable(
            Variable::new(PARTICLE_VARIABLE, program, self.seed.clone())
                .with_dependencies([PARTICLE_VARIABLE])
                .lock_seed_channel(),
        )?;
        Ok(computation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::FLOW_FIELD_PROGRAM;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_setup_from_sphere() {
        let mesh = SourceMesh::fibonacci_sphere(2305, 10.0);
        let setup = ParticleSetup::from_mesh(&mesh, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(setup.size, 49);
        assert_eq!(setup.geometry.draw_range(), 0..2305);
        assert_eq!(setup.seed.texels().len(), 2401);

        let computation = setup.computation(FLOW_FIELD_PROGRAM, &Controls::default()).unwrap();
        assert!(computation.compile().is_ok());
    }

    #[test]
    fn test_setup_rejects_empty_mesh() {
        let result = ParticleSetup::from_mesh(&SourceMesh::new("none"), &mut StdRng::seed_from_u64(0));
        assert!(matches!(result, Err(ExperienceError::Mesh(_))));
    }
}
