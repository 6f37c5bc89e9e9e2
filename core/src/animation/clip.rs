//! Animation clip data.

use std::collections::HashMap;

use crate::math::{Quat, Vec3};

/// A value at a point in time (seconds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
}

impl<T> Keyframe<T> {
    pub fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

/// Keyframe of a translation or scale track.
pub type VectorKey = Keyframe<Vec3>;

/// Keyframe of a rotation track.
pub type RotationKey = Keyframe<Quat>;

/// Keyframe tracks targeting one node by name.
///
/// Each track may be empty, in which case the node's static value for that
/// component is used.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeChannel {
    pub node_name: String,
    pub positions: Vec<VectorKey>,
    pub rotations: Vec<RotationKey>,
    pub scales: Vec<VectorKey>,
}

impl NodeChannel {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_position(mut self, time: f32, value: Vec3) -> Self {
        self.positions.push(Keyframe::new(time, value));
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, time: f32, value: Quat) -> Self {
        self.rotations.push(Keyframe::new(time, value));
        self
    }

    #[must_use]
    pub fn with_scale(mut self, time: f32, value: Vec3) -> Self {
        self.scales.push(Keyframe::new(time, value));
        self
    }

    /// Latest key time over all tracks.
    pub fn end_time(&self) -> f32 {
        let positions = self.positions.iter().map(|k| k.time);
        let rotations = self.rotations.iter().map(|k| k.time);
        let scales = self.scales.iter().map(|k| k.time);
        positions.chain(rotations).chain(scales).fold(0.0, f32::max)
    }
}

/// A named set of node channels.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    name: String,
    duration: f32,
    channels: Vec<NodeChannel>,
    lookup: HashMap<String, usize>,
}

impl AnimationClip {
    /// Build a clip. The duration is the latest key time of any channel.
    ///
    /// If two channels target the same node, the first one wins.
    pub fn new(name: impl Into<String>, channels: Vec<NodeChannel>) -> Self {
        let mut lookup = HashMap::new();
        for (i, channel) in channels.iter().enumerate() {
            lookup.entry(channel.node_name.clone()).or_insert(i);
        }
        let duration = channels
            .iter()
            .map(NodeChannel::end_time)
            .fold(0.0f32, f32::max);
        Self {
            name: name.into(),
            duration,
            channels,
            lookup,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Clip length in seconds.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn channels(&self) -> &[NodeChannel] {
        &self.channels
    }

    /// Channel targeting `node_name`, if any.
    pub fn channel(&self, node_name: &str) -> Option<&NodeChannel> {
        self.lookup.get(node_name).map(|&i| &self.channels[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_latest_key() {
        let clip = AnimationClip::new(
            "walk",
            vec![
                NodeChannel::new("hips")
                    .with_position(0.0, Vec3::zeros())
                    .with_position(1.5, Vec3::x()),
                NodeChannel::new("spine").with_rotation(2.0, Quat::identity()),
            ],
        );
        assert_eq!(clip.duration(), 2.0);
        assert_eq!(clip.name(), "walk");
    }

    #[test]
    fn channel_lookup_by_node_name() {
        let clip = AnimationClip::new(
            "idle",
            vec![
                NodeChannel::new("a").with_scale(0.0, Vec3::repeat(1.0)),
                NodeChannel::new("a").with_scale(0.0, Vec3::repeat(2.0)),
            ],
        );
        let channel = clip.channel("a").unwrap();
        assert_eq!(channel.scales[0].value, Vec3::repeat(1.0));
        assert!(clip.channel("b").is_none());
    }
}
