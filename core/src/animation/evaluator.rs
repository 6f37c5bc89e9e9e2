//! Keyframe interpolation and bone pose evaluation.

use crate::math::{
    Mat4, Quat, Vec3, mat4_from_scale_rotation_translation, quat_slerp, vec3_lerp,
};
use crate::mesh::{MeshNode, MeshSource};

use super::clip::{AnimationClip, Keyframe};

/// How sample times outside a track's key range are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterpolationPolicy {
    /// Clamp the interpolation factor to `[0, 1]`. Times before the first key
    /// yield the first key, times after the last key yield the last key.
    #[default]
    Clamped,
    /// Reject times outside `[first key, last key]` with
    /// [`AnimationError::TimeOutOfRange`]. Single-key tracks accept any time.
    Strict,
}

/// Errors raised while evaluating an animation.
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// A sample time fell outside a track's key range under
    /// [`InterpolationPolicy::Strict`].
    TimeOutOfRange {
        node: String,
        time: f32,
        start: f32,
        end: f32,
    },
}

impl std::fmt::Display for AnimationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TimeOutOfRange {
                node,
                time,
                start,
                end,
            } => write!(
                f,
                "animation time {time} outside key range [{start}, {end}] of node '{node}'"
            ),
        }
    }
}

impl std::error::Error for AnimationError {}

/// Index of the key that starts the interval containing `time`.
///
/// Scans from the first key and returns the first `i` with
/// `time < keys[i + 1].time`; times at or past the last key map to the final
/// interval. Requires at least two keys.
fn find_key_index<T>(keys: &[Keyframe<T>], time: f32) -> usize {
    debug_assert!(keys.len() >= 2);
    for i in 0..keys.len() - 1 {
        if time < keys[i + 1].time {
            return i;
        }
    }
    keys.len() - 2
}

/// Bracketing key index and interpolation factor for `time`.
fn interval<T>(
    keys: &[Keyframe<T>],
    time: f32,
    policy: InterpolationPolicy,
    node: &str,
) -> Result<(usize, f32), AnimationError> {
    let start = keys[0].time;
    let end = keys[keys.len() - 1].time;
    if policy == InterpolationPolicy::Strict && (time < start || time > end) {
        return Err(AnimationError::TimeOutOfRange {
            node: node.to_string(),
            time,
            start,
            end,
        });
    }

    let index = find_key_index(keys, time);
    let delta = keys[index + 1].time - keys[index].time;
    let factor = if delta > 0.0 {
        (time - keys[index].time) / delta
    } else {
        1.0
    };
    Ok((index, factor.clamp(0.0, 1.0)))
}

/// Interpolate a translation or scale track. `None` for an empty track.
pub fn interpolate_vec3(
    keys: &[Keyframe<Vec3>],
    time: f32,
    policy: InterpolationPolicy,
    node: &str,
) -> Result<Option<Vec3>, AnimationError> {
    match keys.len() {
        0 => Ok(None),
        1 => Ok(Some(keys[0].value)),
        _ => {
            let (i, factor) = interval(keys, time, policy, node)?;
            let value = if factor == 0.0 {
                keys[i].value
            } else if factor == 1.0 {
                keys[i + 1].value
            } else {
                vec3_lerp(&keys[i].value, &keys[i + 1].value, factor)
            };
            Ok(Some(value))
        }
    }
}

/// Interpolate a rotation track with slerp. `None` for an empty track.
pub fn interpolate_rotation(
    keys: &[Keyframe<Quat>],
    time: f32,
    policy: InterpolationPolicy,
    node: &str,
) -> Result<Option<Quat>, AnimationError> {
    match keys.len() {
        0 => Ok(None),
        1 => Ok(Some(keys[0].value)),
        _ => {
            let (i, factor) = interval(keys, time, policy, node)?;
            let value = if factor == 0.0 {
                keys[i].value
            } else if factor == 1.0 {
                keys[i + 1].value
            } else {
                quat_slerp(keys[i].value, keys[i + 1].value, factor)
            };
            Ok(Some(value))
        }
    }
}

/// Produces final bone transforms for a mesh at a clip time.
///
/// Holds the output array between evaluations: bones that are not reached
/// by the hierarchy walk keep their previous value.
#[derive(Debug, Clone)]
pub struct AnimationEvaluator {
    policy: InterpolationPolicy,
    bone_transforms: Vec<Mat4>,
}

impl AnimationEvaluator {
    /// Evaluator with `bone_count` identity transforms.
    pub fn new(bone_count: usize) -> Self {
        Self {
            policy: InterpolationPolicy::default(),
            bone_transforms: vec![Mat4::identity(); bone_count],
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: InterpolationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> InterpolationPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: InterpolationPolicy) {
        self.policy = policy;
    }

    /// Transforms from the most recent evaluation, indexed by bone index.
    pub fn bone_transforms(&self) -> &[Mat4] {
        &self.bone_transforms
    }

    /// Evaluate `clip` at `time` (seconds) against `source`'s hierarchy.
    ///
    /// For every bone: `global_inverse * node_world * offset`. Nodes without
    /// a channel keep their static local transform, so an empty clip yields
    /// the bind pose.
    pub fn evaluate(
        &mut self,
        source: &MeshSource,
        clip: &AnimationClip,
        time: f32,
    ) -> Result<&[Mat4], AnimationError> {
        let bone_count = source.bone_count();
        if self.bone_transforms.len() != bone_count {
            self.bone_transforms.resize(bone_count, Mat4::identity());
        }
        self.read_node_hierarchy(source, Some(clip), source.root_node(), &Mat4::identity(), time)?;
        Ok(&self.bone_transforms)
    }

    /// Evaluate the static bind pose.
    pub fn evaluate_bind_pose(&mut self, source: &MeshSource) -> &[Mat4] {
        let bone_count = source.bone_count();
        if self.bone_transforms.len() != bone_count {
            self.bone_transforms.resize(bone_count, Mat4::identity());
        }
        // Without a clip no interpolation runs, so this cannot fail.
        let _ = self.read_node_hierarchy(source, None, source.root_node(), &Mat4::identity(), 0.0);
        &self.bone_transforms
    }

    fn read_node_hierarchy(
        &mut self,
        source: &MeshSource,
        clip: Option<&AnimationClip>,
        node: &MeshNode,
        parent: &Mat4,
        time: f32,
    ) -> Result<(), AnimationError> {
        let local = match clip.and_then(|c| c.channel(&node.name)) {
            Some(channel) => {
                let policy = self.policy;
                let translation = interpolate_vec3(&channel.positions, time, policy, &node.name)?
                    .unwrap_or_else(|| node.transform.translation_vec());
                let rotation = interpolate_rotation(&channel.rotations, time, policy, &node.name)?
                    .unwrap_or_else(|| node.transform.rotation_quat());
                let scale = interpolate_vec3(&channel.scales, time, policy, &node.name)?
                    .unwrap_or_else(|| node.transform.scale_vec());
                mat4_from_scale_rotation_translation(scale, rotation, translation)
            }
            None => node.local_matrix(),
        };

        let world = parent * local;

        if let Some(bone) = source.bone_index(&node.name) {
            let offset = &source.bone_info()[bone as usize].offset_matrix;
            self.bone_transforms[bone as usize] =
                source.global_inverse_transform() * world * offset;
        }

        for child in &node.children {
            self.read_node_hierarchy(source, clip, child, &world, time)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::NodeChannel;
    use crate::math::{mat4_from_translation, quat_from_rotation_y, quat_rotate_vec3};
    use crate::mesh::{
        AnimatedVertex, BoneRegistry, NodeTransform, Submesh, VertexData,
    };
    use rstest::rstest;

    fn keys(values: &[(f32, f32)]) -> Vec<Keyframe<Vec3>> {
        values
            .iter()
            .map(|&(t, x)| Keyframe::new(t, Vec3::new(x, 0.0, 0.0)))
            .collect()
    }

    #[rstest]
    #[case(-5.0)]
    #[case(0.0)]
    #[case(3.5)]
    #[case(100.0)]
    fn single_key_is_returned_unchanged(#[case] time: f32) {
        let track = keys(&[(1.0, 7.0)]);
        for policy in [InterpolationPolicy::Clamped, InterpolationPolicy::Strict] {
            let v = interpolate_vec3(&track, time, policy, "n").unwrap().unwrap();
            assert_eq!(v, Vec3::new(7.0, 0.0, 0.0));
        }
    }

    #[test]
    fn exact_first_and_last_key_times() {
        let track = keys(&[(0.0, 1.0), (1.0, 2.0), (2.0, 4.0)]);
        let policy = InterpolationPolicy::Clamped;
        assert_eq!(interpolate_vec3(&track, 0.0, policy, "n").unwrap().unwrap().x, 1.0);
        assert_eq!(interpolate_vec3(&track, 2.0, policy, "n").unwrap().unwrap().x, 4.0);
        assert_eq!(interpolate_vec3(&track, 1.0, policy, "n").unwrap().unwrap().x, 2.0);
    }

    #[test]
    fn linear_between_keys() {
        let track = keys(&[(0.0, 0.0), (2.0, 10.0)]);
        let v = interpolate_vec3(&track, 0.5, InterpolationPolicy::Clamped, "n")
            .unwrap()
            .unwrap();
        assert!((v.x - 2.5).abs() < 1e-6);
    }

    #[test]
    fn earliest_bracketing_interval_is_used() {
        let track = keys(&[(0.0, 0.0), (1.0, 1.0), (1.0, 5.0), (2.0, 6.0)]);
        assert_eq!(find_key_index(&track, 0.5), 0);
        assert_eq!(find_key_index(&track, 1.0), 2);
        assert_eq!(find_key_index(&track, 9.0), 2);
    }

    #[test]
    fn clamped_policy_masks_out_of_range_times() {
        let track = keys(&[(0.0, 1.0), (1.0, 3.0)]);
        let before = interpolate_vec3(&track, -1.0, InterpolationPolicy::Clamped, "n").unwrap();
        let after = interpolate_vec3(&track, 5.0, InterpolationPolicy::Clamped, "n").unwrap();
        assert_eq!(before.unwrap().x, 1.0);
        assert_eq!(after.unwrap().x, 3.0);
    }

    #[test]
    fn strict_policy_rejects_out_of_range_times() {
        let track = keys(&[(0.0, 1.0), (1.0, 3.0)]);
        let err = interpolate_vec3(&track, 1.5, InterpolationPolicy::Strict, "hips").unwrap_err();
        assert_eq!(
            err,
            AnimationError::TimeOutOfRange {
                node: "hips".into(),
                time: 1.5,
                start: 0.0,
                end: 1.0
            }
        );
        assert!(err.to_string().contains("hips"));
        assert!(interpolate_vec3(&track, 1.0, InterpolationPolicy::Strict, "hips").is_ok());
    }

    #[test]
    fn rotation_exact_keys_and_midpoint() {
        let track = vec![
            Keyframe::new(0.0, Quat::identity()),
            Keyframe::new(1.0, quat_from_rotation_y(std::f32::consts::FRAC_PI_2)),
        ];
        let policy = InterpolationPolicy::Clamped;
        let first = interpolate_rotation(&track, 0.0, policy, "n").unwrap().unwrap();
        let last = interpolate_rotation(&track, 1.0, policy, "n").unwrap().unwrap();
        assert_eq!(first, track[0].value);
        assert_eq!(last, track[1].value);

        let mid = interpolate_rotation(&track, 0.5, policy, "n").unwrap().unwrap();
        let v = quat_rotate_vec3(mid, Vec3::x());
        let expected = quat_rotate_vec3(quat_from_rotation_y(std::f32::consts::FRAC_PI_4), Vec3::x());
        assert!((v - expected).norm() < 1e-5);
    }

    /// Two-bone chain: root -> arm (bone 0) -> hand (bone 1).
    fn rigged_source() -> MeshSource {
        let vertices = VertexData::Animated(vec![AnimatedVertex::default(); 3]);
        let submesh = Submesh::new(0, 0, 3, 3, 0).with_mesh_name("body");
        let mut bones = BoneRegistry::new();
        bones.index_or_insert("arm", Mat4::identity());
        bones.index_or_insert("hand", mat4_from_translation(Vec3::new(0.0, -1.0, 0.0)));

        let root = MeshNode::new("root").with_submeshes(vec![0]).with_children(vec![
            MeshNode::new("arm").with_children(vec![
                MeshNode::new("hand")
                    .with_transform(NodeTransform::IDENTITY.with_translation([0.0, 1.0, 0.0])),
            ]),
        ]);

        MeshSource::from_parts(vertices, vec![[0, 1, 2]], vec![submesh])
            .with_root_node(root)
            .with_bones(bones)
    }

    #[test]
    fn empty_clip_yields_bind_pose() {
        let source = rigged_source();
        let clip = AnimationClip::new("empty", Vec::new());
        let mut evaluator = AnimationEvaluator::new(source.bone_count());
        let transforms = evaluator.evaluate(&source, &clip, 0.3).unwrap().to_vec();
        // hand world = translate(0,1,0), offset = translate(0,-1,0) -> identity
        for m in &transforms {
            assert!((m - Mat4::identity()).norm() < 1e-6);
        }
        let bind = evaluator.evaluate_bind_pose(&source).to_vec();
        assert_eq!(bind, transforms);
    }

    #[test]
    fn parent_motion_propagates_to_children() {
        let source = rigged_source();
        let clip = AnimationClip::new(
            "raise",
            vec![NodeChannel::new("arm")
                .with_position(0.0, Vec3::zeros())
                .with_position(1.0, Vec3::new(0.0, 0.0, 4.0))],
        );
        let mut evaluator = AnimationEvaluator::new(0);
        let transforms = evaluator.evaluate(&source, &clip, 0.5).unwrap();
        assert_eq!(transforms.len(), 2);
        let expected = mat4_from_translation(Vec3::new(0.0, 0.0, 2.0));
        assert!((transforms[0] - expected).norm() < 1e-5);
        assert!((transforms[1] - expected).norm() < 1e-5);
    }

    #[test]
    fn strict_evaluation_propagates_error() {
        let source = rigged_source();
        let clip = AnimationClip::new(
            "raise",
            vec![NodeChannel::new("arm")
                .with_position(0.0, Vec3::zeros())
                .with_position(1.0, Vec3::z())],
        );
        let mut evaluator =
            AnimationEvaluator::new(2).with_policy(InterpolationPolicy::Strict);
        assert!(evaluator.evaluate(&source, &clip, 2.0).is_err());
        assert!(evaluator.evaluate(&source, &clip, 1.0).is_ok());
    }
}
