//! Skeletal animation.
//!
//! - [`AnimationClip`] / [`NodeChannel`] / [`Keyframe`]: imported keyframe data
//! - [`AnimationEvaluator`]: walks a [`MeshSource`](crate::mesh::MeshSource)
//!   hierarchy and produces bone transforms
//! - [`AnimationPlayer`]: playback time bookkeeping

mod clip;
mod evaluator;
mod player;

pub use clip::{AnimationClip, Keyframe, NodeChannel, RotationKey, VectorKey};
pub use evaluator::{
    AnimationError, AnimationEvaluator, InterpolationPolicy, interpolate_rotation,
    interpolate_vec3,
};
pub use player::AnimationPlayer;
