//! CPU-side mesh types.
//!
//! - [`MeshSource`] - Imported mesh: vertices, triangles, submeshes, nodes, bones
//! - [`VertexData`] - Static or animated vertex storage
//! - [`Submesh`] - Contiguous range sharing one material and node transform
//! - [`MeshNode`] / [`NodeTransform`] - Node hierarchy
//! - [`BoneRegistry`] - Bone name to index mapping and offset matrices
//! - [`Aabb`] - Axis-aligned bounds
//!
//! These types are re-exported by `ember-graphics` for convenience.

mod bounds;
mod node;
mod skin;
mod source;
mod vertex;

pub use bounds::Aabb;
pub use node::{MeshNode, NodeTransform};
pub use skin::{BoneInfo, BoneRegistry, BoneWeights, VertexWeight};
pub use source::{MeshSource, Submesh, Triangle};
pub use vertex::{
    AnimatedVertex, BONE_WEIGHT_EPSILON, MAX_BONE_INFLUENCES, StaticVertex, VertexData,
};
