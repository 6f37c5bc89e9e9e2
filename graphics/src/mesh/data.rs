//! Runtime mesh objects.
//!
//! A [`Mesh`] is the per-entity view of a shared [`MeshAsset`]: which
//! submeshes to draw, which materials to draw them with, and for skinned
//! assets the current pose.

use std::sync::Arc;

use ember_core::animation::{AnimationError, AnimationEvaluator, AnimationPlayer};
use ember_core::math::Mat4;
use ember_core::mesh::Submesh;

use crate::materials::MaterialAsset;

use super::asset::MeshAsset;
use super::table::MaterialTable;

/// A drawable instance of a [`MeshAsset`].
///
/// Cloning a mesh shares the asset and copies the submesh selection, the
/// material table and the pose.
#[derive(Debug, Clone)]
pub struct Mesh {
    asset: Arc<MeshAsset>,
    submeshes: Vec<u32>,
    materials: MaterialTable,
    bone_transforms: Vec<Mat4>,
    player: AnimationPlayer,
    evaluator: AnimationEvaluator,
}

impl Mesh {
    /// Mesh drawing every submesh of `asset` with the asset's materials.
    pub fn new(asset: &Arc<MeshAsset>) -> Self {
        let bone_count = asset.bone_count();
        Self {
            asset: Arc::clone(asset),
            submeshes: (0..asset.submeshes().len() as u32).collect(),
            materials: MaterialTable::from_materials(asset.materials()),
            bone_transforms: vec![Mat4::identity(); bone_count],
            player: AnimationPlayer::new(),
            evaluator: AnimationEvaluator::new(bone_count),
        }
    }

    pub fn asset(&self) -> &Arc<MeshAsset> {
        &self.asset
    }

    /// Indices of the submeshes drawn, in draw order.
    pub fn submeshes(&self) -> &[u32] {
        &self.submeshes
    }

    /// Select the submeshes to draw. An empty slice selects all of them.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of range for the asset.
    pub fn set_submeshes(&mut self, submeshes: &[u32]) {
        let count = self.asset.submeshes().len() as u32;
        if submeshes.is_empty() {
            self.submeshes = (0..count).collect();
            return;
        }
        for &index in submeshes {
            assert!(
                index < count,
                "submesh index {index} out of range for mesh with {count} submeshes"
            );
        }
        self.submeshes = submeshes.to_vec();
    }

    pub fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut MaterialTable {
        &mut self.materials
    }

    /// Material used for `submesh`: the table's entry for its material
    /// index, else the asset's own material.
    pub fn material_for(&self, submesh: &Submesh) -> Option<&MaterialAsset> {
        self.materials
            .material(submesh.material_index)
            .or_else(|| self.asset.material(submesh.material_index))
    }

    pub fn is_animated(&self) -> bool {
        self.asset.is_animated()
    }

    /// Current pose, one matrix per bone. Empty for static meshes.
    pub fn bone_transforms(&self) -> &[Mat4] {
        &self.bone_transforms
    }

    /// Overwrite the pose. An empty slice resets every bone to identity.
    ///
    /// # Panics
    ///
    /// Panics if `transforms` is neither empty nor one matrix per bone.
    pub fn update_bone_transforms(&mut self, transforms: &[Mat4]) {
        if transforms.is_empty() {
            self.bone_transforms.fill(Mat4::identity());
            return;
        }
        assert_eq!(
            transforms.len(),
            self.bone_transforms.len(),
            "expected {} bone transforms",
            self.bone_transforms.len()
        );
        self.bone_transforms.copy_from_slice(transforms);
    }

    pub fn player(&self) -> &AnimationPlayer {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut AnimationPlayer {
        &mut self.player
    }

    pub fn evaluator_mut(&mut self) -> &mut AnimationEvaluator {
        &mut self.evaluator
    }

    /// Advance playback by `dt` seconds and refresh the pose.
    ///
    /// Without a clip at the player's index the bind pose is used. Static
    /// meshes are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error when a strict evaluator samples outside a track.
    pub fn update(&mut self, dt: f32) -> Result<(), AnimationError> {
        if !self.asset.is_animated() {
            return Ok(());
        }

        let source = self.asset.source();
        let pose = match source.animations().get(self.player.clip_index()) {
            Some(clip) => {
                let duration = clip.duration();
                self.player.update(dt, duration);
                self.evaluator
                    .evaluate(source, clip, self.player.time(duration))?
            }
            None => self.evaluator.evaluate_bind_pose(source),
        };
        self.bone_transforms.copy_from_slice(pose);
        Ok(())
    }
}
