use std::sync::{Arc, Weak};

use crate::backend::BufferId;
use crate::device::GraphicsDevice;
use crate::types::BufferDescriptor;

/// Device buffer, released through the device queue on drop.
///
/// ```ignore
/// let vertices = device.create_buffer_init(
///     &BufferDescriptor::new(bytes.len() as u64, BufferUsage::VERTEX),
///     bytes,
/// )?;
/// device.bind_vertex_buffer(&vertices)?;
/// ```
pub struct Buffer {
    id: BufferId,
    device: Weak<GraphicsDevice>,
    descriptor: BufferDescriptor,
}

impl Buffer {
    pub(crate) fn new(id: BufferId, device: Weak<GraphicsDevice>, descriptor: BufferDescriptor) -> Self {
        Self {
            id,
            device,
            descriptor,
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Owning device, unless it has already been dropped.
    pub fn device(&self) -> Option<Arc<GraphicsDevice>> {
        self.device.upgrade()
    }

    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.descriptor
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.descriptor.size
    }

    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(device) = self.device.upgrade() {
            device.release_buffer(self.id);
        }
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id)
            .field("label", &self.descriptor.label)
            .field("size", &self.descriptor.size)
            .field("usage", &self.descriptor.usage)
            .finish()
    }
}

static_assertions::assert_impl_all!(Buffer: Send, Sync);
