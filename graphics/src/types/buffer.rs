use bitflags::bitflags;

bitflags! {
    /// How a buffer may be bound. Binds check these flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BufferUsage: u32 {
        const VERTEX = 1 << 0;
        const INDEX = 1 << 1;
        const UNIFORM = 1 << 2;
        /// Required by [`GraphicsDevice::write_buffer`](crate::GraphicsDevice::write_buffer).
        const COPY_DST = 1 << 3;
    }
}

/// Size, usage and debug label of a buffer to create.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BufferDescriptor {
    pub label: Option<String>,
    /// Size in bytes.
    pub size: u64,
    pub usage: BufferUsage,
}

impl BufferDescriptor {
    pub fn new(size: u64, usage: BufferUsage) -> Self {
        Self {
            label: None,
            size,
            usage,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_descriptor() {
        let desc = BufferDescriptor::new(1024, BufferUsage::VERTEX | BufferUsage::COPY_DST)
            .with_label("vertices");
        assert_eq!(desc.size, 1024);
        assert!(desc.usage.contains(BufferUsage::VERTEX));
        assert!(desc.usage.contains(BufferUsage::COPY_DST));
        assert!(!desc.usage.contains(BufferUsage::INDEX));
        assert_eq!(desc.label.as_deref(), Some("vertices"));
    }

    #[test]
    fn test_default_usage_is_empty() {
        assert!(BufferDescriptor::default().usage.is_empty());
    }
}
