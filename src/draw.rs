//! Draw-side particle attributes.
//!
//! Each rendered point is one instance carrying the UV of its simulation
//! texel, a colour carried over from the sampled mesh and a random size
//! factor. All three arrays are built once in vertex order, the same order
//! the state texture was encoded in, so attribute `i` always belongs to
//! particle `i`.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use rand::Rng;

use crate::grid::texel_uv;

/// Per-instance vertex record.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub uv: [f32; 2],
    pub color: [f32; 3],
    pub size: f32,
}

impl ParticleInstance {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x3, 2 => Float32];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Render attributes for `count` particles on a `size`-wide grid.
#[derive(Debug, Clone)]
pub struct ParticleGeometry {
    count: u32,
    size: u32,
    instances: Vec<ParticleInstance>,
}

impl ParticleGeometry {
    /// Build the attribute arrays.
    ///
    /// `colors` are used as-is when present and `count` long; otherwise
    /// every particle is white. Sizes are uniform in `[0, 1)` from `rng`.
    pub fn new<R: Rng + ?Sized>(
        count: u32,
        size: u32,
        colors: Option<&[[f32; 3]]>,
        rng: &mut R,
    ) -> Self {
        let colors = colors.filter(|c| c.len() == count as usize);
        let instances = (0..count)
            .map(|i| ParticleInstance {
                uv: texel_uv(i, size),
                color: colors.map_or([1.0; 3], |c| c[i as usize]),
                size: rng.gen::<f32>(),
            })
            .collect();

        Self {
            count,
            size,
            instances,
        }
    }

    /// Instances to rasterize. Never includes padding texels.
    pub fn draw_range(&self) -> Range<u32> {
        0..self.count
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn grid_size(&self) -> u32 {
        self.size
    }

    pub fn instances(&self) -> &[ParticleInstance] {
        &self.instances
    }

    pub fn uv(&self, index: usize) -> [f32; 2] {
        self.instances[index].uv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_instance_layout() {
        assert_eq!(std::mem::size_of::<ParticleInstance>(), 24);
        let layout = ParticleInstance::layout();
        assert_eq!(layout.attributes[1].offset, 8);
        assert_eq!(layout.attributes[2].offset, 20);
    }

    #[test]
    fn test_colors_carried_in_vertex_order() {
        let colors = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let geometry = ParticleGeometry::new(3, 2, Some(&colors), &mut StdRng::seed_from_u64(0));
        for (i, instance) in geometry.instances().iter().enumerate() {
            assert_eq!(instance.color, colors[i]);
            assert!((0.0..1.0).contains(&instance.size));
        }
        assert_eq!(geometry.uv(2), [0.25, 0.75]);
    }

    #[test]
    fn test_mismatched_colors_fall_back_to_white() {
        let colors = [[1.0, 0.0, 0.0]];
        let geometry = ParticleGeometry::new(3, 2, Some(&colors), &mut StdRng::seed_from_u64(0));
        assert!(geometry.instances().iter().all(|i| i.color == [1.0; 3]));
    }
}
