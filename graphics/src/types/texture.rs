use bitflags::bitflags;

use ember_core::texture::TextureFormat;

bitflags! {
    /// How a texture may be used. The default allows sampling and upload.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        const TEXTURE_BINDING = 1 << 0;
        const COPY_DST = 1 << 1;
    }
}

impl Default for TextureUsage {
    fn default() -> Self {
        Self::TEXTURE_BINDING | Self::COPY_DST
    }
}

/// Dimensions, format and usage of a 2D texture to create.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    pub label: Option<String>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

impl TextureDescriptor {
    pub fn new_2d(width: u32, height: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            label: None,
            width,
            height,
            format,
            usage,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Size in bytes of one full upload of this texture.
    pub fn byte_size(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * self.format.bytes_per_pixel() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_descriptor() {
        let desc = TextureDescriptor::new_2d(
            256,
            128,
            TextureFormat::Rgba8Unorm,
            TextureUsage::default(),
        )
        .with_label("albedo");
        assert_eq!(desc.width, 256);
        assert_eq!(desc.height, 128);
        assert_eq!(desc.byte_size(), 256 * 128 * 4);
        assert!(desc.usage.contains(TextureUsage::TEXTURE_BINDING));
        assert_eq!(desc.label.as_deref(), Some("albedo"));
    }
}
