//! # Ember Engine Core
//!
//! CPU-side building blocks of the Ember engine:
//!
//! - [`math`]: nalgebra aliases and transform helpers
//! - [`mesh`]: imported mesh data ([`MeshSource`](mesh::MeshSource), vertex
//!   layouts, submeshes, node hierarchy, bounds, bones)
//! - [`import`]: glTF mesh importer (feature `import`)
//! - [`material`]: imported material descriptions
//! - [`texture`]: decoded CPU textures
//! - [`animation`]: keyframe clips, bone pose evaluation and playback

pub mod animation;
#[cfg(feature = "import")]
pub mod import;
pub mod material;
pub mod math;
pub mod mesh;
pub mod texture;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version once at startup.
pub fn init() {
    log::info!("Ember Core v{} initialized", VERSION);
}
