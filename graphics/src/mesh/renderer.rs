//! Per-frame mesh submission.

use std::sync::Arc;

use ember_core::math::Mat4;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::materials::MaterialAsset;
use crate::resources::Buffer;
use crate::shader::{DRAW_GROUP, FRAME_GROUP};
use crate::types::{BufferDescriptor, BufferUsage};

use super::asset::MeshAsset;
use super::data::Mesh;

/// Bone matrices the skinned shaders can address.
pub const MAX_BONES: usize = 100;

const MAT4_SIZE: u64 = std::mem::size_of::<Mat4>() as u64;

struct MeshDraw {
    asset: Arc<MeshAsset>,
    submesh: usize,
    material: MaterialAsset,
    transform: Mat4,
    bones: Option<Arc<[Mat4]>>,
}

/// Counters for the last flushed frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshRendererStats {
    pub draw_calls: u32,
    pub skinned_draws: u32,
    pub index_count: u32,
}

/// Queues submesh draws during a frame and replays them in submission order.
///
/// Each draw binds the asset's buffers, the submesh's material, the pose
/// (for skinned assets) and the object transform, then issues one indexed
/// draw over the submesh's range.
pub struct MeshRenderer {
    device: Arc<GraphicsDevice>,
    camera_buffer: Arc<Buffer>,
    bone_buffer: Arc<Buffer>,
    queue: Vec<MeshDraw>,
    stats: MeshRendererStats,
}

impl MeshRenderer {
    /// # Errors
    ///
    /// Returns an error if the frame buffers cannot be created.
    pub fn new(device: &Arc<GraphicsDevice>) -> Result<Self, GraphicsError> {
        let camera_buffer = device.create_buffer(
            &BufferDescriptor::new(MAT4_SIZE, BufferUsage::UNIFORM | BufferUsage::COPY_DST)
                .with_label("mesh camera"),
        )?;
        let bone_buffer = device.create_buffer(
            &BufferDescriptor::new(
                MAT4_SIZE * MAX_BONES as u64,
                BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            )
            .with_label("mesh bones"),
        )?;

        Ok(Self {
            device: Arc::clone(device),
            camera_buffer,
            bone_buffer,
            queue: Vec::new(),
            stats: MeshRendererStats::default(),
        })
    }

    /// Start a frame: upload and bind the camera and drop undrawn submissions.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the upload.
    pub fn begin_frame(&mut self, view_projection: &Mat4) -> Result<(), GraphicsError> {
        if !self.queue.is_empty() {
            log::warn!(
                "Discarding {} mesh draws that were never flushed",
                self.queue.len()
            );
            self.queue.clear();
        }
        self.stats = MeshRendererStats::default();
        self.device
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(view_projection))?;
        self.device
            .bind_uniform_buffer(&self.camera_buffer, FRAME_GROUP)
    }

    /// Queue every selected submesh of `mesh` at `transform`.
    ///
    /// Submeshes without a material are skipped with a warning.
    pub fn submit(&mut self, mesh: &Mesh, transform: &Mat4) {
        let asset = mesh.asset();
        let bones: Option<Arc<[Mat4]>> = mesh
            .is_animated()
            .then(|| Arc::from(mesh.bone_transforms()));

        for &index in mesh.submeshes() {
            let submesh = &asset.submeshes()[index as usize];
            let Some(material) = mesh.material_for(submesh) else {
                log::warn!(
                    "Submesh '{}' has no material at index {}; skipped",
                    submesh.mesh_name,
                    submesh.material_index
                );
                continue;
            };
            self.queue.push(MeshDraw {
                asset: Arc::clone(asset),
                submesh: index as usize,
                material: material.clone(),
                transform: transform * submesh.transform,
                bones: bones.clone(),
            });
        }
    }

    /// Number of draws waiting for [`flush`](Self::flush).
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Replay the queue to the backend.
    ///
    /// Returns the number of draws issued.
    ///
    /// # Errors
    ///
    /// Returns the first backend error; the rest of the queue is dropped.
    pub fn flush(&mut self) -> Result<usize, GraphicsError> {
        let queue = std::mem::take(&mut self.queue);
        let mut bound_asset: Option<&Arc<MeshAsset>> = None;

        for draw in &queue {
            if !bound_asset.is_some_and(|asset| Arc::ptr_eq(asset, &draw.asset)) {
                self.device.bind_vertex_buffer(draw.asset.vertex_buffer())?;
                self.device.bind_index_buffer(draw.asset.index_buffer())?;
                bound_asset = Some(&draw.asset);
            }

            draw.material.bind()?;

            if let Some(bones) = &draw.bones {
                self.upload_bones(bones)?;
                self.stats.skinned_draws += 1;
            }

            self.device
                .push_constants(bytemuck::bytes_of(&draw.transform))?;

            let submesh = &draw.asset.submeshes()[draw.submesh];
            self.device.draw_indexed(
                submesh.index_count,
                submesh.base_index,
                submesh.base_vertex,
            )?;
            self.stats.draw_calls += 1;
            self.stats.index_count += submesh.index_count;
        }

        Ok(queue.len())
    }

    pub fn stats(&self) -> MeshRendererStats {
        self.stats
    }

    fn upload_bones(&self, bones: &[Mat4]) -> Result<(), GraphicsError> {
        let bones = if bones.len() > MAX_BONES {
            log::warn!(
                "Pose has {} bones; only the first {} are uploaded",
                bones.len(),
                MAX_BONES
            );
            &bones[..MAX_BONES]
        } else {
            bones
        };
        self.device
            .write_buffer(&self.bone_buffer, 0, bytemuck::cast_slice(bones))?;
        self.device.bind_uniform_buffer(&self.bone_buffer, DRAW_GROUP)
    }
}

impl std::fmt::Debug for MeshRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshRenderer")
            .field("queued", &self.queue.len())
            .field("stats", &self.stats)
            .finish()
    }
}
