//! Material system for the graphics engine.
//!
//! - [`Material`] - Named uniform storage and textures laid out by a shader's reflection
//! - [`MaterialInstance`] - Override layer over a shared material
//! - [`MaterialHandle`] - Either of the two
//! - [`MaterialAsset`] - Typed access to the standard PBR parameters
//!
//! # Ownership
//!
//! An instance holds a strong reference to its parent material; the parent
//! keeps only weak references to its instances, so dropping every instance
//! never keeps a material alive and dropping an instance deregisters it.

mod asset;
mod instance;
mod material;

pub use asset::{
    ALBEDO_COLOR_UNIFORM, ALBEDO_TEXTURE, EMISSION_UNIFORM, METALNESS_TEXTURE, METALNESS_UNIFORM,
    MaterialAsset, MaterialHandle, NORMAL_TEXTURE, ROUGHNESS_TEXTURE, ROUGHNESS_UNIFORM,
    USE_NORMAL_MAP_UNIFORM,
};
pub use instance::MaterialInstance;
pub use material::Material;
