//! Source meshes and the mesh sampler.
//!
//! A [`SourceMesh`] is whatever the asset loader produced: a list of
//! geometries, each with optional position and colour attributes. The
//! sampler only ever looks at the first geometry, and never mutates it.

use crate::error::MeshError;

/// One geometry (glTF primitive) of a loaded mesh.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    /// Vertex positions, `None` when the asset has no position attribute.
    pub positions: Option<Vec<[f32; 3]>>,
    /// Per-vertex RGB colours in the same vertex order as `positions`.
    pub colors: Option<Vec<[f32; 3]>>,
}

impl Geometry {
    /// Geometry with positions only.
    pub fn from_positions(positions: Vec<[f32; 3]>) -> Self {
        Self {
            positions: Some(positions),
            colors: None,
        }
    }

    /// Attach per-vertex colours.
    pub fn with_colors(mut self, colors: Vec<[f32; 3]>) -> Self {
        self.colors = Some(colors);
        self
    }
}

/// A loaded triangle mesh, as handed over by the asset loader.
#[derive(Debug, Clone, Default)]
pub struct SourceMesh {
    pub name: String,
    pub geometries: Vec<Geometry>,
}

impl SourceMesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometries: Vec::new(),
        }
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometries.push(geometry);
        self
    }

    /// Evenly distributed points on a sphere, coloured from ice blue at the
    /// bottom to white at the top.
    ///
    /// Used when no model file is supplied.
    pub fn fibonacci_sphere(count: u32, radius: f32) -> Self {
        let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
        let n = count.max(1) as f32;

        let mut positions = Vec::with_capacity(count as usize);
        let mut colors = Vec::with_capacity(count as usize);
        for i in 0..count {
            let y = 1.0 - 2.0 * (i as f32 + 0.5) / n;
            let ring = (1.0 - y * y).max(0.0).sqrt();
            let theta = golden_angle * i as f32;

            positions.push([
                theta.cos() * ring * radius,
                y * radius,
                theta.sin() * ring * radius,
            ]);

            let t = y * 0.5 + 0.5;
            colors.push([0.55 + 0.45 * t, 0.75 + 0.25 * t, 1.0]);
        }

        Self::new("Fibonacci Sphere")
            .with_geometry(Geometry::from_positions(positions).with_colors(colors))
    }
}

/// Particle source data extracted from a mesh.
#[derive(Debug, Clone)]
pub struct SampledMesh {
    /// Flat `x, y, z` sequence, `3 * count` floats.
    pub positions: Vec<f32>,
    /// Number of vertices, which is also the particle count.
    pub count: u32,
    /// Per-vertex colours in sampling order, if the mesh had a usable
    /// colour attribute.
    pub colors: Option<Vec<[f32; 3]>>,
}

/// Extract positions (and colours, when present) from the first geometry.
pub fn sample_mesh(mesh: &SourceMesh) -> Result<SampledMesh, MeshError> {
    let geometry = mesh.geometries.first().ok_or(MeshError::NoGeometry)?;
    let positions = geometry
        .positions
        .as_ref()
        .ok_or(MeshError::MissingPositions)?;
    if positions.is_empty() {
        return Err(MeshError::Empty);
    }

    let count = positions.len() as u32;
    let flat: Vec<f32> = positions.iter().flat_map(|p| p.iter().copied()).collect();

    let colors = match &geometry.colors {
        Some(colors) if colors.len() == positions.len() => Some(colors.clone()),
        Some(colors) => {
            log::warn!(
                "'{}': colour attribute has {} entries for {} vertices, ignoring it",
                mesh.name,
                colors.len(),
                positions.len()
            );
            None
        }
        None => None,
    };

    log::info!("Sampled {} vertices from '{}'", count, mesh.name);

    Ok(SampledMesh {
        positions: flat,
        count,
        colors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_flattens_first_geometry() {
        let mesh = SourceMesh::new("pair")
            .with_geometry(Geometry::from_positions(vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]))
            .with_geometry(Geometry::from_positions(vec![[9.0, 9.0, 9.0]]));

        let sampled = sample_mesh(&mesh).unwrap();
        assert_eq!(sampled.count, 2);
        assert_eq!(sampled.positions, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(sampled.colors.is_none());
    }

    #[test]
    fn test_sample_missing_positions() {
        let mesh = SourceMesh::new("bare").with_geometry(Geometry::default());
        assert!(matches!(sample_mesh(&mesh), Err(MeshError::MissingPositions)));

        let empty = SourceMesh::new("empty");
        assert!(matches!(sample_mesh(&empty), Err(MeshError::NoGeometry)));

        let hollow = SourceMesh::new("hollow").with_geometry(Geometry::from_positions(vec![]));
        assert!(matches!(sample_mesh(&hollow), Err(MeshError::Empty)));
    }

    #[test]
    fn test_sample_keeps_matching_colors_only() {
        let good = SourceMesh::new("good").with_geometry(
            Geometry::from_positions(vec![[0.0; 3], [1.0; 3]]).with_colors(vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
        );
        let sampled = sample_mesh(&good).unwrap();
        assert_eq!(sampled.colors.unwrap()[1], [0.0, 1.0, 0.0]);

        let bad = SourceMesh::new("bad")
            .with_geometry(Geometry::from_positions(vec![[0.0; 3], [1.0; 3]]).with_colors(vec![[1.0; 3]]));
        assert!(sample_mesh(&bad).unwrap().colors.is_none());
    }

    #[test]
    fn test_sample_does_not_mutate_source() {
        let mesh = SourceMesh::fibonacci_sphere(100, 2.0);
        let before = mesh.geometries[0].positions.clone();
        let _ = sample_mesh(&mesh).unwrap();
        assert_eq!(mesh.geometries[0].positions, before);
    }

    #[test]
    fn test_fibonacci_sphere_on_radius() {
        let mesh = SourceMesh::fibonacci_sphere(2305, 3.0);
        let positions = mesh.geometries[0].positions.as_ref().unwrap();
        assert_eq!(positions.len(), 2305);
        for p in positions {
            let r = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((r - 3.0).abs() < 1e-3);
        }
    }
}
