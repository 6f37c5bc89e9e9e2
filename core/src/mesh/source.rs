//! Imported mesh data.
//!
//! [`MeshSource`] is the CPU-side, immutable result of importing a model:
//! one shared vertex array, one shared triangle array, a submesh table that
//! partitions both, the node tree, bone data, materials and animation clips.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::animation::AnimationClip;
use crate::material::MaterialDescription;
use crate::math::{Mat4, Vec3};

use super::bounds::Aabb;
use super::node::MeshNode;
use super::skin::{BoneInfo, BoneRegistry};
use super::vertex::VertexData;

/// Three vertex indices, relative to the owning submesh's base vertex.
pub type Triangle = [u32; 3];

/// A contiguous vertex/index range sharing one material and one node transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Submesh {
    /// First vertex of this submesh in the shared vertex array.
    pub base_vertex: u32,
    /// First index (not triangle) of this submesh in the shared index array.
    pub base_index: u32,
    pub vertex_count: u32,
    pub index_count: u32,
    /// Index into the asset's material list.
    pub material_index: u32,
    /// World transform accumulated from the node hierarchy.
    pub transform: Mat4,
    /// Local transform of the owning node.
    pub local_transform: Mat4,
    /// Bounds of the submesh's vertices in mesh space. Empty for animated assets.
    pub bounding_box: Aabb,
    /// Name of the node that references this submesh.
    pub node_name: String,
    /// Name of the source mesh.
    pub mesh_name: String,
}

impl Submesh {
    pub fn new(
        base_vertex: u32,
        base_index: u32,
        vertex_count: u32,
        index_count: u32,
        material_index: u32,
    ) -> Self {
        Self {
            base_vertex,
            base_index,
            vertex_count,
            index_count,
            material_index,
            transform: Mat4::identity(),
            local_transform: Mat4::identity(),
            bounding_box: Aabb::empty(),
            node_name: String::new(),
            mesh_name: String::new(),
        }
    }

    #[must_use]
    pub fn with_mesh_name(mut self, name: impl Into<String>) -> Self {
        self.mesh_name = name.into();
        self
    }

    /// First triangle of this submesh in the shared triangle array.
    pub fn base_triangle(&self) -> usize {
        (self.base_index / 3) as usize
    }

    pub fn triangle_count(&self) -> usize {
        (self.index_count / 3) as usize
    }
}

/// CPU-side imported mesh. Immutable once built.
#[derive(Debug, Clone)]
pub struct MeshSource {
    vertices: VertexData,
    indices: Vec<Triangle>,
    submeshes: Vec<Submesh>,
    materials: Vec<MaterialDescription>,
    bones: BoneRegistry,
    root: MeshNode,
    global_inverse_transform: Mat4,
    animations: Vec<AnimationClip>,
    bounding_box: Aabb,
    file_path: Option<PathBuf>,
}

impl MeshSource {
    /// Build a mesh from raw vertex, triangle and submesh data.
    ///
    /// With an empty `submeshes` list a single submesh spanning every vertex
    /// and triangle is created. The node tree is a single root holding every
    /// submesh with identity transform.
    ///
    /// # Panics
    ///
    /// Panics if the submesh ranges do not partition the vertex and index
    /// arrays.
    pub fn from_parts(vertices: VertexData, indices: Vec<Triangle>, submeshes: Vec<Submesh>) -> Self {
        let submeshes = if submeshes.is_empty() {
            vec![
                Submesh::new(
                    0,
                    0,
                    vertices.len() as u32,
                    (indices.len() * 3) as u32,
                    0,
                )
                .with_mesh_name("mesh"),
            ]
        } else {
            submeshes
        };

        let root = MeshNode::new("root").with_submeshes((0..submeshes.len() as u32).collect());

        let mut source = Self {
            vertices,
            indices,
            submeshes,
            materials: Vec::new(),
            bones: BoneRegistry::new(),
            root: MeshNode::default(),
            global_inverse_transform: Mat4::identity(),
            animations: Vec::new(),
            bounding_box: Aabb::empty(),
            file_path: None,
        };
        assert!(
            source.is_partitioned(),
            "submesh ranges must partition the vertex and index arrays"
        );
        source.set_root(root);
        source
    }

    /// Replace the material list.
    #[must_use]
    pub fn with_materials(mut self, materials: Vec<MaterialDescription>) -> Self {
        self.materials = materials;
        self
    }

    /// Replace the node tree, re-deriving submesh transforms and bounds.
    #[must_use]
    pub fn with_root_node(mut self, root: MeshNode) -> Self {
        self.set_root(root);
        self
    }

    /// Attach bone data.
    #[must_use]
    pub fn with_bones(mut self, bones: BoneRegistry) -> Self {
        self.bones = bones;
        self
    }

    /// Attach animation clips.
    #[must_use]
    pub fn with_animations(mut self, animations: Vec<AnimationClip>) -> Self {
        self.animations = animations;
        self
    }

    /// Remember the file this mesh was imported from.
    #[must_use]
    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    fn set_root(&mut self, root: MeshNode) {
        self.global_inverse_transform = root
            .local_matrix()
            .try_inverse()
            .unwrap_or_else(Mat4::identity);
        self.traverse_nodes(&root, &Mat4::identity());
        self.root = root;
        self.compute_bounds();
    }

    fn traverse_nodes(&mut self, node: &MeshNode, parent: &Mat4) {
        let local = node.local_matrix();
        let world = parent * local;
        for &index in &node.submeshes {
            let submesh = &mut self.submeshes[index as usize];
            submesh.transform = world;
            submesh.local_transform = local;
            submesh.node_name = node.name.clone();
        }
        for child in &node.children {
            self.traverse_nodes(child, &world);
        }
    }

    fn compute_bounds(&mut self) {
        let animated = self.vertices.is_animated();
        let mut total = Aabb::empty();
        for submesh in &mut self.submeshes {
            let start = submesh.base_vertex as usize;
            let end = start + submesh.vertex_count as usize;
            let local = Aabb::from_points((start..end).map(|i| self.vertices.position(i)));
            submesh.bounding_box = if animated { Aabb::empty() } else { local };
            total.union(&local.transformed(&submesh.transform));
        }
        if total.is_empty() {
            total = Aabb::new(Vec3::zeros(), Vec3::zeros());
        }
        self.bounding_box = total;
    }

    /// Whether the submesh ranges are disjoint and cover every vertex and index.
    pub fn is_partitioned(&self) -> bool {
        let vertex_ranges = self
            .submeshes
            .iter()
            .map(|s| (s.base_vertex, s.vertex_count));
        let index_ranges = self.submeshes.iter().map(|s| (s.base_index, s.index_count));
        ranges_partition(vertex_ranges, self.vertices.len() as u32)
            && ranges_partition(index_ranges, self.index_count() as u32)
    }

    pub fn vertices(&self) -> &VertexData {
        &self.vertices
    }

    pub fn indices(&self) -> &[Triangle] {
        &self.indices
    }

    /// Index data as raw bytes, ready for upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn submeshes(&self) -> &[Submesh] {
        &self.submeshes
    }

    pub fn materials(&self) -> &[MaterialDescription] {
        &self.materials
    }

    pub fn bone_mapping(&self) -> &HashMap<String, u32> {
        self.bones.mapping()
    }

    pub fn bone_info(&self) -> &[BoneInfo] {
        self.bones.info()
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn bone_index(&self, name: &str) -> Option<u32> {
        self.bones.bone_index(name)
    }

    pub fn root_node(&self) -> &MeshNode {
        &self.root
    }

    /// Inverse of the root node's transform.
    pub fn global_inverse_transform(&self) -> &Mat4 {
        &self.global_inverse_transform
    }

    pub fn animations(&self) -> &[AnimationClip] {
        &self.animations
    }

    /// Bounds of every submesh after its node transform.
    pub fn bounding_box(&self) -> &Aabb {
        &self.bounding_box
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn is_animated(&self) -> bool {
        self.vertices.is_animated()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len() * 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Mesh-space corner positions of every triangle of a submesh.
    ///
    /// # Panics
    ///
    /// Panics if `submesh` is out of range.
    pub fn triangle_positions(&self, submesh: usize) -> Vec<[Vec3; 3]> {
        let s = &self.submeshes[submesh];
        let base = s.base_vertex as usize;
        self.indices[s.base_triangle()..s.base_triangle() + s.triangle_count()]
            .iter()
            .map(|t| {
                [
                    self.vertices.position(base + t[0] as usize),
                    self.vertices.position(base + t[1] as usize),
                    self.vertices.position(base + t[2] as usize),
                ]
            })
            .collect()
    }

    /// Dump every vertex at trace level.
    pub fn log_vertex_buffer(&self) {
        if !log::log_enabled!(log::Level::Trace) {
            return;
        }
        log::trace!(
            "Vertex buffer of {:?}: {} vertices",
            self.file_path,
            self.vertices.len()
        );
        match &self.vertices {
            VertexData::Static(vertices) => {
                for (i, v) in vertices.iter().enumerate() {
                    log::trace!(
                        "  {i}: pos={:?} normal={:?} uv={:?}",
                        v.position,
                        v.normal,
                        v.tex_coord
                    );
                }
            }
            VertexData::Animated(vertices) => {
                for (i, v) in vertices.iter().enumerate() {
                    log::trace!(
                        "  {i}: pos={:?} bones={:?} weights={:?}",
                        v.position,
                        v.bone_ids,
                        v.bone_weights
                    );
                }
            }
        }
    }
}

/// Whether `(start, count)` ranges tile `[0, total)` exactly.
fn ranges_partition(ranges: impl Iterator<Item = (u32, u32)>, total: u32) -> bool {
    let mut ranges: Vec<(u32, u32)> = ranges.collect();
    ranges.sort_unstable();
    let mut cursor = 0u32;
    for (start, count) in ranges {
        if start != cursor {
            return false;
        }
        cursor += count;
    }
    cursor == total
}
