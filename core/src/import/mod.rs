//! Mesh file import.
//!
//! Converts a glTF 2.0 file (`.gltf` with embedded or external buffers, or
//! binary `.glb`) into a [`MeshSource`]:
//!
//! - every triangle primitive becomes a [`Submesh`](crate::mesh::Submesh);
//!   strips and fans are triangulated, points and lines are skipped
//! - missing normals, tangents/binormals and texture coordinates are
//!   generated (see [`ImportOptions`])
//! - a file containing any animation is imported with the skinned vertex
//!   layout, bones registered in first-encountered order
//! - materials become [`MaterialDescription`](crate::material::MaterialDescription)s
//!   with texture paths resolved against the model's directory
//!
//! Recoverable failures (unreadable file, parse errors, no meshes) return
//! [`ImportError`]. Content that violates the format's own guarantees
//! (no positions, non-triangular faces) panics.
//!
//! # Example
//!
//! ```ignore
//! use ember_core::import::{ImportOptions, import_mesh};
//!
//! let source = import_mesh("assets/models/character.gltf", &ImportOptions::default())?;
//! println!("{} submeshes, {} bones", source.submeshes().len(), source.bone_count());
//! ```

mod buffers;
mod error;
mod geometry;
mod loader;
mod options;
#[cfg(test)]
mod tests;

pub use error::ImportError;
pub use options::ImportOptions;

use std::path::Path;

use crate::mesh::MeshSource;

/// Import the model at `path`.
///
/// Relative buffer and texture URIs are resolved against the file's parent
/// directory. Failures are logged before being returned.
pub fn import_mesh(
    path: impl AsRef<Path>,
    options: &ImportOptions,
) -> Result<MeshSource, ImportError> {
    let path = path.as_ref();
    let result = std::fs::read(path)
        .map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })
        .and_then(|data| load(&data, path.parent(), Some(path), options));

    match result {
        Ok(source) => Ok(source.with_file_path(path)),
        Err(e) => {
            log::error!("Failed to import '{}': {e}", path.display());
            Err(e)
        }
    }
}

/// Import a model from memory.
///
/// `base_dir` resolves relative buffer and texture URIs; without it only
/// embedded data can be used.
pub fn import_mesh_from_slice(
    data: &[u8],
    base_dir: Option<&Path>,
    options: &ImportOptions,
) -> Result<MeshSource, ImportError> {
    load(data, base_dir, None, options)
}

fn load(
    data: &[u8],
    base_dir: Option<&Path>,
    file_path: Option<&Path>,
    options: &ImportOptions,
) -> Result<MeshSource, ImportError> {
    let no_meshes = || ImportError::NoMeshes {
        path: file_path.unwrap_or(Path::new("<memory>")).to_path_buf(),
    };

    let gltf_dep::Gltf { document, blob } = gltf_dep::Gltf::from_slice(data)?;
    if document.meshes().next().is_none() {
        return Err(no_meshes());
    }

    let buffers = buffers::resolve_buffers(&document, blob, base_dir)?;
    let stated_factors = loader::stated_factors(data);
    let mut ctx =
        loader::LoadContext::new(document, buffers, base_dir, *options, stated_factors);

    let geometry = ctx.load_geometry()?;
    if geometry.submeshes.is_empty() {
        return Err(no_meshes());
    }
    let materials = ctx.load_materials(geometry.uses_fallback_material);
    let root = ctx.load_root();
    let animations = ctx.load_animations()?;

    let source = MeshSource::from_parts(geometry.vertices, geometry.triangles, geometry.submeshes)
        .with_materials(materials)
        .with_root_node(root)
        .with_bones(geometry.bones)
        .with_animations(animations);

    log::info!(
        "Imported {}: {} submeshes, {} vertices, {} triangles, {} materials, {} bones, {} animations",
        file_path.map_or_else(|| "<memory>".into(), |p| p.display().to_string()),
        source.submeshes().len(),
        source.vertex_count(),
        source.triangle_count(),
        source.materials().len(),
        source.bone_count(),
        source.animations().len()
    );

    Ok(source)
}
