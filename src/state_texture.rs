//! Host-side particle state images.
//!
//! A [`StateTexture`] is the CPU copy of an `Rgba32Float` simulation
//! texture: `size * size` texels in row-major order, each holding
//! `(x, y, z, seed)` for one particle. Texels past the particle count stay
//! zeroed and are never drawn.

use rand::Rng;

use crate::error::SetupError;

/// Square `Rgba32Float` image held on the host.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTexture {
    size: u32,
    texels: Vec<[f32; 4]>,
}

impl StateTexture {
    /// All-zero texture of `size * size` texels.
    pub fn zeroed(size: u32) -> Self {
        Self {
            size,
            texels: vec![[0.0; 4]; (size as usize) * (size as usize)],
        }
    }

    /// Build a texture from raw texels.
    ///
    /// Returns `None` if `texels.len() != size * size`.
    pub fn from_texels(size: u32, texels: Vec<[f32; 4]>) -> Option<Self> {
        if texels.len() != (size as usize) * (size as usize) {
            return None;
        }
        Some(Self { size, texels })
    }

    /// Encode particle positions into a fresh state texture.
    ///
    /// Texel `i < count` receives `positions[3i..3i + 3]` in channels 0-2 and
    /// a uniform random value in `[0, 1)` drawn from `rng` in channel 3.
    /// Everything else stays zero.
    pub fn encode<R: Rng + ?Sized>(
        positions: &[f32],
        count: u32,
        size: u32,
        rng: &mut R,
    ) -> Result<Self, SetupError> {
        if size == 0 {
            return Err(SetupError::ZeroGrid);
        }
        if (count as u64) > (size as u64) * (size as u64) {
            return Err(SetupError::Capacity { count, size });
        }
        let needed = count as usize * 3;
        if positions.len() < needed {
            return Err(SetupError::ShortPositions {
                available: positions.len(),
                needed,
            });
        }

        let mut texture = Self::zeroed(size);
        for (texel, xyz) in texture.texels.iter_mut().zip(positions[..needed].chunks_exact(3)) {
            *texel = [xyz[0], xyz[1], xyz[2], rng.gen::<f32>()];
        }
        Ok(texture)
    }

    /// Edge length in texels.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Texels in row-major order.
    #[inline]
    pub fn texels(&self) -> &[[f32; 4]] {
        &self.texels
    }

    /// Texel at linear index `index`.
    #[inline]
    pub fn texel(&self, index: usize) -> [f32; 4] {
        self.texels[index]
    }

    /// Raw bytes for upload (`size * size * 16`).
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }
}
