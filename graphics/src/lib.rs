//! # Ember Graphics
//!
//! GPU-facing layer of the Ember engine.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`GpuBackend`] - Trait for the command queue a device submits to, with a
//!   recording [`DummyBackend`] for tests and headless use
//! - [`GraphicsDevice`] - Validates requests and turns them into backend
//!   commands; owns the shared flat textures
//! - [`Buffer`] / [`Texture`] - RAII handles whose release goes through the
//!   same queue as every other command
//! - [`shader`] - WGSL reflection of uniform blocks and texture slots
//! - [`materials`] - Materials, instances and PBR material assets
//! - [`mesh`] - GPU mesh assets, runtime meshes and mesh submission
//!
//! ## Example
//!
//! ```ignore
//! use ember_graphics::{DummyBackend, GraphicsDevice, ShaderLibrary};
//! use ember_graphics::mesh::{Mesh, MeshAsset, MeshRenderer};
//!
//! let device = GraphicsDevice::new(Arc::new(DummyBackend::new()))?;
//! let library = ShaderLibrary::with_standard_shaders()?;
//! let asset = MeshAsset::import(&device, &library, "models/crate.gltf", &Default::default())?;
//!
//! let mut renderer = MeshRenderer::new(&device)?;
//! renderer.begin_frame(&view_projection)?;
//! renderer.submit(&Mesh::new(&asset), &transform);
//! renderer.flush()?;
//! ```

pub mod backend;
pub mod device;
pub mod error;
pub mod materials;
pub mod mesh;
pub mod resources;
pub mod shader;
pub mod types;

// Re-export main types for convenience
pub use backend::{BackendCommand, BufferId, DummyBackend, GpuBackend, ShaderStage, TextureId};
pub use device::{DeviceCapabilities, GraphicsDevice};
pub use error::GraphicsError;
pub use materials::{Material, MaterialAsset, MaterialHandle, MaterialInstance};
pub use mesh::{MaterialTable, Mesh, MeshAsset, MeshImportError, MeshRenderer};
pub use resources::{Buffer, Texture};
pub use shader::{Shader, ShaderLibrary, ShaderReflection};
pub use types::{BufferDescriptor, BufferUsage, TextureDescriptor, TextureFormat, TextureUsage};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version once at startup.
pub fn init() {
    log::info!("Ember Graphics v{} initialized", VERSION);
}
