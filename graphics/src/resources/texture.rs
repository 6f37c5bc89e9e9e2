use std::sync::{Arc, Weak};

use crate::backend::TextureId;
use crate::device::GraphicsDevice;
use crate::types::{TextureDescriptor, TextureFormat};

/// Device texture, released through the device queue on drop.
///
/// Two handles name the same texture when their [`id`](Self::id)s are equal.
pub struct Texture {
    id: TextureId,
    device: Weak<GraphicsDevice>,
    descriptor: TextureDescriptor,
}

impl Texture {
    pub(crate) fn new(
        id: TextureId,
        device: Weak<GraphicsDevice>,
        descriptor: TextureDescriptor,
    ) -> Self {
        Self {
            id,
            device,
            descriptor,
        }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Owning device, unless it has already been dropped.
    pub fn device(&self) -> Option<Arc<GraphicsDevice>> {
        self.device.upgrade()
    }

    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    pub fn width(&self) -> u32 {
        self.descriptor.width
    }

    pub fn height(&self) -> u32 {
        self.descriptor.height
    }

    pub fn format(&self) -> TextureFormat {
        self.descriptor.format
    }

    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if let Some(device) = self.device.upgrade() {
            device.release_texture(self.id);
        }
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("width", &self.descriptor.width)
            .field("height", &self.descriptor.height)
            .field("format", &self.descriptor.format)
            .field("label", &self.descriptor.label)
            .finish()
    }
}

static_assertions::assert_impl_all!(Texture: Send, Sync);
