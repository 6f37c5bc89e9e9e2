//! Vertex formats produced by the mesh importer.
//!
//! A mesh is either entirely static or entirely animated; [`VertexData`]
//! carries one of the two layouts for the whole asset.

use crate::math::Vec3;

/// Maximum number of bone influences stored per animated vertex.
pub const MAX_BONE_INFLUENCES: usize = 4;

/// Weights at or below this value count as "no influence".
pub const BONE_WEIGHT_EPSILON: f32 = 1.0e-6;

/// Vertex of a non-skinned mesh.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StaticVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub binormal: [f32; 3],
    pub tex_coord: [f32; 2],
}

/// Vertex of a skinned mesh: the static attributes plus up to
/// [`MAX_BONE_INFLUENCES`] bone index/weight pairs.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AnimatedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub binormal: [f32; 3],
    pub tex_coord: [f32; 2],
    pub bone_ids: [u32; MAX_BONE_INFLUENCES],
    pub bone_weights: [f32; MAX_BONE_INFLUENCES],
}

impl AnimatedVertex {
    /// Build a skinned vertex with no influences from a static one.
    pub fn from_static(v: &StaticVertex) -> Self {
        Self {
            position: v.position,
            normal: v.normal,
            tangent: v.tangent,
            binormal: v.binormal,
            tex_coord: v.tex_coord,
            bone_ids: [0; MAX_BONE_INFLUENCES],
            bone_weights: [0.0; MAX_BONE_INFLUENCES],
        }
    }

    /// Store a bone influence in the first free slot.
    ///
    /// Returns `false` (and logs a warning) when all slots are taken; the
    /// influence is dropped.
    pub fn add_bone_data(&mut self, bone_index: u32, weight: f32) -> bool {
        for slot in 0..MAX_BONE_INFLUENCES {
            if self.bone_weights[slot] == 0.0 {
                self.bone_ids[slot] = bone_index;
                self.bone_weights[slot] = weight;
                return true;
            }
        }
        log::warn!(
            "Vertex has more than {} bone influences; dropping bone {} (weight {})",
            MAX_BONE_INFLUENCES,
            bone_index,
            weight
        );
        false
    }

    /// Sum of the stored weights.
    pub fn weight_sum(&self) -> f32 {
        self.bone_weights.iter().sum()
    }

    /// Rescale the weights so they sum to one. Vertices without any
    /// influence are left untouched.
    pub fn normalize_weights(&mut self) {
        let sum = self.weight_sum();
        if sum > BONE_WEIGHT_EPSILON {
            for w in &mut self.bone_weights {
                *w /= sum;
            }
        }
    }
}

/// Vertex storage of a mesh, tagged by layout.
#[derive(Clone, Debug, PartialEq)]
pub enum VertexData {
    /// Position, normal, tangent, binormal, texcoord.
    Static(Vec<StaticVertex>),
    /// Static attributes plus bone indices and weights.
    Animated(Vec<AnimatedVertex>),
}

impl VertexData {
    /// Number of vertices.
    pub fn len(&self) -> usize {
        match self {
            Self::Static(v) => v.len(),
            Self::Animated(v) => v.len(),
        }
    }

    /// Whether there are no vertices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this is the skinned layout.
    pub fn is_animated(&self) -> bool {
        matches!(self, Self::Animated(_))
    }

    /// Size of one vertex in bytes.
    pub fn stride(&self) -> usize {
        match self {
            Self::Static(_) => std::mem::size_of::<StaticVertex>(),
            Self::Animated(_) => std::mem::size_of::<AnimatedVertex>(),
        }
    }

    /// Raw bytes, ready for upload.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Static(v) => bytemuck::cast_slice(v),
            Self::Animated(v) => bytemuck::cast_slice(v),
        }
    }

    /// Position of vertex `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn position(&self, index: usize) -> Vec3 {
        let p = match self {
            Self::Static(v) => v[index].position,
            Self::Animated(v) => v[index].position,
        };
        Vec3::from(p)
    }

    /// Iterate over all vertex positions.
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        (0..self.len()).map(move |i| self.position(i))
    }
}

impl Default for VertexData {
    fn default() -> Self {
        Self::Static(Vec::new())
    }
}
