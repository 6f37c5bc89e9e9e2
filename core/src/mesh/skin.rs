//! Bone registration and per-vertex weight assignment.

use std::collections::HashMap;

use crate::math::Mat4;

use super::source::Submesh;
use super::vertex::{AnimatedVertex, BONE_WEIGHT_EPSILON};

/// Per-bone data, indexed by the dense bone index.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneInfo {
    /// Bone (node) name.
    pub name: String,
    /// Transform from mesh bind-pose space into the bone's local space.
    pub offset_matrix: Mat4,
}

/// A single influence of a bone on a vertex, relative to a submesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexWeight {
    /// Vertex index relative to the submesh's base vertex.
    pub vertex_id: u32,
    pub weight: f32,
}

/// All influences of one bone on one submesh.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneWeights {
    pub bone_name: String,
    pub offset_matrix: Mat4,
    pub weights: Vec<VertexWeight>,
}

impl BoneWeights {
    pub fn new(bone_name: impl Into<String>, offset_matrix: Mat4) -> Self {
        Self {
            bone_name: bone_name.into(),
            offset_matrix,
            weights: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_weight(mut self, vertex_id: u32, weight: f32) -> Self {
        self.weights.push(VertexWeight { vertex_id, weight });
        self
    }

    /// Whether every weight is effectively zero.
    pub fn is_negligible(&self) -> bool {
        self.weights.iter().all(|w| w.weight <= BONE_WEIGHT_EPSILON)
    }
}

/// Name → dense bone index mapping plus per-bone info.
///
/// Indices are allocated in first-encountered order and never reused.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneRegistry {
    mapping: HashMap<String, u32>,
    info: Vec<BoneInfo>,
}

impl BoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `name`, registering it with `offset_matrix` on first sight.
    pub fn index_or_insert(&mut self, name: &str, offset_matrix: Mat4) -> u32 {
        if let Some(&index) = self.mapping.get(name) {
            return index;
        }
        let index = self.info.len() as u32;
        self.info.push(BoneInfo {
            name: name.to_string(),
            offset_matrix,
        });
        self.mapping.insert(name.to_string(), index);
        index
    }

    /// Register the bones of one submesh and write their influences into
    /// `vertices` (the whole asset's vertex array).
    ///
    /// Bones whose weights are all zero are skipped.
    ///
    /// # Panics
    ///
    /// Panics if a weight references a vertex outside the submesh.
    pub fn apply(
        &mut self,
        vertices: &mut [AnimatedVertex],
        submesh: &Submesh,
        bones: &[BoneWeights],
    ) {
        for bone in bones {
            if bone.is_negligible() {
                log::trace!("Skipping bone '{}' with no influence", bone.bone_name);
                continue;
            }
            let bone_index = self.index_or_insert(&bone.bone_name, bone.offset_matrix);
            for w in &bone.weights {
                assert!(
                    w.vertex_id < submesh.vertex_count,
                    "bone '{}' references vertex {} but submesh '{}' has {} vertices",
                    bone.bone_name,
                    w.vertex_id,
                    submesh.mesh_name,
                    submesh.vertex_count
                );
                let vertex = (submesh.base_vertex + w.vertex_id) as usize;
                vertices[vertex].add_bone_data(bone_index, w.weight);
            }
        }
    }

    pub fn bone_index(&self, name: &str) -> Option<u32> {
        self.mapping.get(name).copied()
    }

    pub fn mapping(&self) -> &HashMap<String, u32> {
        &self.mapping
    }

    pub fn info(&self) -> &[BoneInfo] {
        &self.info
    }

    pub fn len(&self) -> usize {
        self.info.len()
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_empty()
    }
}
