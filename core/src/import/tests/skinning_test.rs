//! Animated import: skinned vertices, bone registration and clips.

use super::{Fixture, triangle_attributes};
use crate::animation::AnimationEvaluator;
use crate::import::{ImportOptions, import_mesh_from_slice};
use crate::math::{Mat4, Vec3};
use crate::mesh::{MeshSource, VertexData};

#[rustfmt::skip]
const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, 0.0, 0.0, 1.0,
];

#[rustfmt::skip]
const DOWN_ONE: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, -1.0, 0.0, 1.0,
];

/// Triangle skinned to a two-joint chain `hips -> spine`, with a rotation
/// clip on `spine` and a cubic-spline translation on `hips`.
fn skinned_fixture() -> Fixture {
    let mut f = Fixture::default();
    let attrs = triangle_attributes(&mut f);
    let joints = f.joints(&[[0, 0, 0, 0], [0, 1, 0, 0], [1, 0, 0, 0]]);
    let weights = f.vec4(&[
        [1.0, 0.0, 0.0, 0.0],
        [0.25, 0.25, 0.0, 0.0],
        [1.0, 0.0, 0.0, 0.0],
    ]);
    let mesh = f.mesh(
        "body",
        &format!(r#"{attrs},"JOINTS_0":{joints},"WEIGHTS_0":{weights}"#),
        None,
        None,
        4,
    );

    let skinned = f.node("body_node", &format!(r#""mesh":{mesh},"skin":0"#));
    let spine = f.node("spine", r#""translation":[0.0,1.0,0.0]"#);
    let hips = f.node("hips", &format!(r#""children":[{spine}]"#));
    f.scene_roots.extend([skinned, hips]);

    let ibm = f.matrices(&[IDENTITY, DOWN_ONE]);
    f.skins.push(format!(
        r#"{{"joints":[{hips},{spine}],"inverseBindMatrices":{ibm}}}"#
    ));

    let times = f.scalars(&[0.0, 1.0]);
    let rotations = f.vec4(&[[0.0, 0.0, 0.0, 1.0], [0.0, 0.0, 0.707_106_8, 0.707_106_8]]);
    let spline_times = f.scalars(&[0.0, 2.0]);
    let spline = f.vec3(&[
        [0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0],
        [0.0, 0.0, 3.0],
        [0.0, 0.0, 0.0],
    ]);
    f.animations.push(format!(
        r#"{{"name":"wave","samplers":[{{"input":{times},"output":{rotations}}},{{"input":{spline_times},"output":{spline},"interpolation":"CUBICSPLINE"}}],"channels":[{{"sampler":0,"target":{{"node":{spine},"path":"rotation"}}}},{{"sampler":1,"target":{{"node":{hips},"path":"translation"}}}}]}}"#
    ));
    f
}

fn import_skinned(options: &ImportOptions) -> MeshSource {
    import_mesh_from_slice(&skinned_fixture().to_bytes(), None, options).unwrap()
}

#[test]
fn test_bones_registered_in_joint_order() {
    let source = import_skinned(&ImportOptions::default());

    assert!(source.is_animated());
    assert_eq!(source.bone_count(), 2);
    assert_eq!(source.bone_index("hips"), Some(0));
    assert_eq!(source.bone_index("spine"), Some(1));
    assert_eq!(source.bone_info()[1].offset_matrix, Mat4::from_column_slice(&DOWN_ONE));
    assert_eq!(source.bone_mapping().len(), 2);
}

#[test]
fn test_vertex_influences_are_kept_as_authored() {
    let source = import_skinned(&ImportOptions::default());
    let VertexData::Animated(vertices) = source.vertices() else {
        panic!("expected animated vertices");
    };

    assert_eq!(vertices[0].bone_ids, [0, 0, 0, 0]);
    assert_eq!(vertices[0].bone_weights, [1.0, 0.0, 0.0, 0.0]);
    assert_eq!(vertices[1].bone_ids, [0, 1, 0, 0]);
    assert_eq!(vertices[1].bone_weights, [0.25, 0.25, 0.0, 0.0]);
    assert_eq!(vertices[2].bone_ids, [1, 0, 0, 0]);
    assert_eq!(vertices[2].bone_weights, [1.0, 0.0, 0.0, 0.0]);
}

#[test]
fn test_optional_weight_normalization() {
    let options = ImportOptions::default().with_normalize_bone_weights(true);
    let source = import_skinned(&options);
    let VertexData::Animated(vertices) = source.vertices() else {
        panic!("expected animated vertices");
    };
    assert_eq!(vertices[1].bone_weights, [0.5, 0.5, 0.0, 0.0]);
}

#[test]
fn test_animated_submeshes_have_no_local_bounds() {
    let source = import_skinned(&ImportOptions::default());
    assert!(source.submeshes()[0].bounding_box.is_empty());
    assert!(!source.bounding_box().is_empty());
}

#[test]
fn test_clips_are_imported() {
    let source = import_skinned(&ImportOptions::default());
    assert_eq!(source.animations().len(), 1);

    let clip = &source.animations()[0];
    assert_eq!(clip.name(), "wave");
    assert_eq!(clip.duration(), 2.0);

    let spine = clip.channel("spine").unwrap();
    assert_eq!(spine.rotations.len(), 2);
    assert!(spine.positions.is_empty());

    let hips = clip.channel("hips").unwrap();
    let values: Vec<Vec3> = hips.positions.iter().map(|k| k.value).collect();
    assert_eq!(values, vec![Vec3::zeros(), Vec3::new(0.0, 0.0, 3.0)]);
}

#[test]
fn test_first_frame_matches_bind_pose() {
    let source = import_skinned(&ImportOptions::default());
    let mut evaluator = AnimationEvaluator::new(source.bone_count());
    let transforms = evaluator
        .evaluate(&source, &source.animations()[0], 0.0)
        .unwrap();
    for m in transforms {
        assert!((m - Mat4::identity()).norm() < 1e-5, "{m}");
    }
}

#[test]
fn test_animation_without_skin_uses_animated_layout() {
    let mut f = Fixture::default();
    let attrs = triangle_attributes(&mut f);
    let mesh = f.mesh("prop", &attrs, None, None, 4);
    let node = f.node("prop", &format!(r#""mesh":{mesh}"#));
    f.scene_roots.push(node);
    let times = f.scalars(&[0.0, 1.0]);
    let offsets = f.vec3(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
    f.animations.push(format!(
        r#"{{"samplers":[{{"input":{times},"output":{offsets}}}],"channels":[{{"sampler":0,"target":{{"node":{node},"path":"translation"}}}}]}}"#
    ));

    let source = import_mesh_from_slice(&f.to_bytes(), None, &ImportOptions::default()).unwrap();
    assert!(source.is_animated());
    assert_eq!(source.bone_count(), 0);
    assert_eq!(source.animations()[0].name(), "animation_0");
    let VertexData::Animated(vertices) = source.vertices() else {
        panic!("expected animated vertices");
    };
    assert!(vertices.iter().all(|v| v.weight_sum() == 0.0));
}
