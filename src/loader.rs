//! glTF/GLB model loading.
//!
//! Produces a [`SourceMesh`] from the first mesh reachable from the default
//! scene. Only vertex positions and the first colour set are read; the
//! particle pipeline has no use for normals, UVs or materials.

use std::path::Path;

use crate::error::MeshError;
use crate::mesh::{Geometry, SourceMesh};

/// Load a `.glb` or `.gltf` file from disk.
pub fn load_gltf<P: AsRef<Path>>(path: P) -> Result<SourceMesh, MeshError> {
    let path = path.as_ref();
    log::info!("Loading model '{}'", path.display());
    let (document, buffers, _images) = gltf::import(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    Ok(convert(&document, &buffers, name))
}

/// Load a glTF asset already in memory.
pub fn load_gltf_slice(data: &[u8]) -> Result<SourceMesh, MeshError> {
    let (document, buffers, _images) = gltf::import_slice(data)?;
    Ok(convert(&document, &buffers, "model".to_string()))
}

fn convert(document: &gltf::Document, buffers: &[gltf::buffer::Data], name: String) -> SourceMesh {
    let mut mesh = SourceMesh::new(name);

    let Some(source) = first_mesh(document) else {
        return mesh;
    };
    if let Some(mesh_name) = source.name() {
        mesh.name = mesh_name.to_string();
    }

    for primitive in source.primitives() {
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|b| b.0.as_slice()));

        let positions = reader.read_positions().map(|p| p.collect::<Vec<_>>());
        let colors = reader.read_colors(0).map(|c| c.into_rgb_f32().collect::<Vec<_>>());

        log::debug!(
            "Primitive {}: {} positions, colours: {}",
            primitive.index(),
            positions.as_ref().map_or(0, |p| p.len()),
            colors.is_some()
        );

        mesh.geometries.push(Geometry { positions, colors });
    }

    mesh
}

/// First mesh in depth-first order from the default scene, or the first mesh
/// in the document when no scene references one.
fn first_mesh(document: &gltf::Document) -> Option<gltf::Mesh<'_>> {
    let scene = document.default_scene().or_else(|| document.scenes().next());
    if let Some(scene) = scene {
        for node in scene.nodes() {
            if let Some(mesh) = find_in_node(node) {
                return Some(mesh);
            }
        }
    }
    document.meshes().next()
}

fn find_in_node(node: gltf::Node<'_>) -> Option<gltf::Mesh<'_>> {
    if let Some(mesh) = node.mesh() {
        return Some(mesh);
    }
    node.children().find_map(find_in_node)
}
