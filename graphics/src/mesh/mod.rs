//! Meshes on the GPU.
//!
//! - [`MeshAsset`]: an imported [`MeshSource`](ember_core::mesh::MeshSource)
//!   uploaded once, with one base material per imported material
//! - [`Mesh`]: a per-entity view of an asset (submesh selection, material
//!   overrides, pose)
//! - [`MaterialTable`]: sparse material overrides by material index
//! - [`MeshRenderer`]: per-frame submission of meshes to the backend

mod asset;
mod data;
#[cfg(test)]
mod fixtures;
mod renderer;
mod table;

pub use asset::{MeshAsset, MeshImportError};
pub use data::Mesh;
pub use renderer::{MAX_BONES, MeshRenderer, MeshRendererStats};
pub use table::MaterialTable;
