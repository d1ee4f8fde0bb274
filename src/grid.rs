//! Simulation grid sizing and texel addressing.
//!
//! Particles live one per texel in a square grid, stored in row-major order:
//! particle `i` sits at column `i % size`, row `i / size`. The same mapping is
//! used by the state texture encoder and by the per-vertex UV attribute, so
//! a particle's draw-side attributes always line up with its simulated state.

use crate::error::SetupError;

/// Smallest `size` such that `size * size >= count`.
///
/// Fails with [`SetupError::ZeroGrid`] for an empty particle set.
pub fn grid_size(count: u32) -> Result<u32, SetupError> {
    if count == 0 {
        return Err(SetupError::ZeroGrid);
    }

    let n = count as u64;
    let mut size = (n as f64).sqrt().ceil() as u64;
    // Float sqrt can be off by one near perfect squares.
    while size * size < n {
        size += 1;
    }
    while size > 1 && (size - 1) * (size - 1) >= n {
        size -= 1;
    }
    Ok(size as u32)
}

/// Column and row of texel `index`.
#[inline]
pub fn texel_coord(index: u32, size: u32) -> (u32, u32) {
    (index % size, index / size)
}

/// Normalized coordinate of the centre of texel `index`.
#[inline]
pub fn texel_uv(index: u32, size: u32) -> [f32; 2] {
    let (x, y) = texel_coord(index, size);
    let s = size as f32;
    [(x as f32 + 0.5) / s, (y as f32 + 0.5) / s]
}

/// Texel addressed by a UV produced with [`texel_uv`].
///
/// Mirrors the lookup in the particle vertex shader.
#[inline]
pub fn uv_to_texel(uv: [f32; 2], size: u32) -> (u32, u32) {
    let s = size as f32;
    let x = (uv[0] * s).floor().clamp(0.0, s - 1.0) as u32;
    let y = (uv[1] * s).floor().clamp(0.0, s - 1.0) as u32;
    (x, y)
}
