//! Shared mesh fixtures for tests.

use std::sync::Arc;

use ember_core::animation::{AnimationClip, NodeChannel};
use ember_core::material::MaterialDescription;
use ember_core::math::{Vec3, mat4_from_translation};
use ember_core::mesh::{
    AnimatedVertex, BoneRegistry, MeshNode, MeshSource, NodeTransform, StaticVertex, Submesh,
    VertexData,
};

use crate::backend::DummyBackend;
use crate::device::GraphicsDevice;
use crate::shader::ShaderLibrary;

pub(crate) fn setup() -> (Arc<GraphicsDevice>, Arc<DummyBackend>, ShaderLibrary) {
    let backend = Arc::new(DummyBackend::new());
    let device = GraphicsDevice::new(backend.clone()).unwrap();
    let library = ShaderLibrary::with_standard_shaders().unwrap();
    backend.clear();
    (device, backend, library)
}

fn vertex(x: f32, y: f32) -> StaticVertex {
    StaticVertex {
        position: [x, y, 0.0],
        normal: [0.0, 0.0, 1.0],
        ..Default::default()
    }
}

/// One red triangle.
pub(crate) fn triangle_source() -> MeshSource {
    let vertices = VertexData::Static(vec![vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(0.0, 1.0)]);
    MeshSource::from_parts(vertices, vec![[0, 1, 2]], Vec::new()).with_materials(vec![
        MaterialDescription::new()
            .with_name("red")
            .with_albedo_color([1.0, 0.0, 0.0]),
    ])
}

/// Two quads as two submeshes with two materials.
pub(crate) fn two_part_source() -> MeshSource {
    let quad = [vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(1.0, 1.0), vertex(0.0, 1.0)];
    let mut vertices = quad.to_vec();
    vertices.extend(quad);
    let indices = vec![[0, 1, 2], [2, 3, 0], [0, 1, 2], [2, 3, 0]];
    let submeshes = vec![
        Submesh::new(0, 0, 4, 6, 0).with_mesh_name("left"),
        Submesh::new(4, 6, 4, 6, 1).with_mesh_name("right"),
    ];
    MeshSource::from_parts(VertexData::Static(vertices), indices, submeshes).with_materials(vec![
        MaterialDescription::new().with_name("left"),
        MaterialDescription::new().with_name("right"),
    ])
}

/// Skinned triangle on a two-bone chain (arm, hand) with one clip moving
/// the arm 4 units along z over one second.
pub(crate) fn rigged_source() -> MeshSource {
    let vertices = VertexData::Animated(vec![AnimatedVertex::default(); 3]);
    let submesh = Submesh::new(0, 0, 3, 3, 0).with_mesh_name("body");
    let mut bones = BoneRegistry::new();
    bones.index_or_insert("arm", mat4_from_translation(Vec3::zeros()));
    bones.index_or_insert("hand", mat4_from_translation(Vec3::new(0.0, -1.0, 0.0)));

    let root = MeshNode::new("root")
        .with_submeshes(vec![0])
        .with_children(vec![MeshNode::new("arm").with_children(vec![
            MeshNode::new("hand")
                .with_transform(NodeTransform::IDENTITY.with_translation([0.0, 1.0, 0.0])),
        ])]);

    let clip = AnimationClip::new(
        "raise",
        vec![
            NodeChannel::new("arm")
                .with_position(0.0, Vec3::zeros())
                .with_position(1.0, Vec3::new(0.0, 0.0, 4.0)),
        ],
    );

    MeshSource::from_parts(vertices, vec![[0, 1, 2]], vec![submesh])
        .with_root_node(root)
        .with_bones(bones)
        .with_animations(vec![clip])
}
