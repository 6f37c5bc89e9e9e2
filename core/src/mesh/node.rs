//! Node hierarchy of an imported mesh.
//!
//! The hierarchy keeps the source file's node tree. Nodes reference
//! submeshes by index and carry their local transform, which the importer
//! accumulates into per-submesh world transforms and the animation
//! evaluator walks to pose bones.

use crate::math::{Mat4, Quat, Vec3, mat4_from_scale_rotation_translation, quat_from_array};

/// Node transform decomposed into translation, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    /// Translation [x, y, z].
    pub translation: [f32; 3],
    /// Rotation quaternion [x, y, z, w].
    pub rotation: [f32; 4],
    /// Scale [x, y, z].
    pub scale: [f32; 3],
}

impl NodeTransform {
    /// Identity transform: no translation, identity rotation, unit scale.
    pub const IDENTITY: Self = Self {
        translation: [0.0, 0.0, 0.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0, 1.0, 1.0],
    };

    /// Returns this transform with a different translation.
    #[must_use]
    pub const fn with_translation(mut self, translation: [f32; 3]) -> Self {
        self.translation = translation;
        self
    }

    /// Returns this transform with a different rotation.
    #[must_use]
    pub const fn with_rotation(mut self, rotation: [f32; 4]) -> Self {
        self.rotation = rotation;
        self
    }

    /// Returns this transform with a different scale.
    #[must_use]
    pub const fn with_scale(mut self, scale: [f32; 3]) -> Self {
        self.scale = scale;
        self
    }

    pub fn translation_vec(&self) -> Vec3 {
        Vec3::from(self.translation)
    }

    pub fn rotation_quat(&self) -> Quat {
        quat_from_array(self.rotation)
    }

    pub fn scale_vec(&self) -> Vec3 {
        Vec3::from(self.scale)
    }

    /// Compose into `T * R * S`.
    pub fn to_matrix(&self) -> Mat4 {
        mat4_from_scale_rotation_translation(
            self.scale_vec(),
            self.rotation_quat(),
            self.translation_vec(),
        )
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A node in the mesh hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    /// Node name. Unnamed source nodes get a generated `node_<index>` name.
    pub name: String,
    /// Transform relative to the parent node.
    pub transform: NodeTransform,
    /// Indices into [`MeshSource::submeshes`](super::MeshSource::submeshes).
    pub submeshes: Vec<u32>,
    /// Child nodes.
    pub children: Vec<MeshNode>,
}

impl MeshNode {
    /// Creates a new node with identity transform and no attachments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: NodeTransform::IDENTITY,
            submeshes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set the local transform.
    #[must_use]
    pub fn with_transform(mut self, transform: NodeTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the submesh indices.
    #[must_use]
    pub fn with_submeshes(mut self, submeshes: Vec<u32>) -> Self {
        self.submeshes = submeshes;
        self
    }

    /// Set the child nodes.
    #[must_use]
    pub fn with_children(mut self, children: Vec<MeshNode>) -> Self {
        self.children = children;
        self
    }

    /// Local transform as a matrix.
    pub fn local_matrix(&self) -> Mat4 {
        self.transform.to_matrix()
    }

    /// Depth-first search by name.
    pub fn find(&self, name: &str) -> Option<&MeshNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Total number of nodes in this sub-tree.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(MeshNode::node_count).sum::<usize>()
    }
}

impl Default for MeshNode {
    fn default() -> Self {
        Self::new("root")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{quat_from_rotation_y, quat_to_array, transform_point};

    #[test]
    fn identity_transform_is_identity_matrix() {
        assert_eq!(NodeTransform::IDENTITY.to_matrix(), Mat4::identity());
    }

    #[test]
    fn builder_transform_matches_trs() {
        let t = NodeTransform::IDENTITY
            .with_translation([1.0, 2.0, 3.0])
            .with_rotation(quat_to_array(quat_from_rotation_y(0.5)))
            .with_scale([2.0, 2.0, 2.0]);
        let p = transform_point(&t.to_matrix(), &Vec3::zeros());
        assert!((p - Vec3::new(1.0, 2.0, 3.0)).norm() < 1e-6);
    }

    #[test]
    fn find_and_count_nodes() {
        let root = MeshNode::new("root").with_children(vec![
            MeshNode::new("hips").with_children(vec![MeshNode::new("spine")]),
            MeshNode::new("prop").with_submeshes(vec![0]),
        ]);
        assert_eq!(root.node_count(), 4);
        assert!(root.find("spine").is_some());
        assert_eq!(root.find("prop").map(|n| n.submeshes.clone()), Some(vec![0]));
        assert!(root.find("missing").is_none());
    }
}
