use std::fmt;
use std::path::{Path, PathBuf};

/// Pixel format of texture data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// 8-bit RGBA, linear.
    Rgba8Unorm,
    /// 8-bit RGBA, sRGB encoded colour.
    #[default]
    Rgba8UnormSrgb,
    /// 32-bit float red channel.
    R32Float,
}

impl TextureFormat {
    /// Size of one texel in bytes.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8Unorm | Self::Rgba8UnormSrgb | Self::R32Float => 4,
        }
    }
}

/// Errors produced while loading or decoding a texture.
#[derive(Debug)]
pub enum TextureError {
    /// The file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The bytes are not a supported image.
    Decode(String),
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read texture '{}': {source}", path.display())
            }
            Self::Decode(msg) => write!(f, "image decode error: {msg}"),
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Decode(_) => None,
        }
    }
}

#[cfg(feature = "import")]
impl From<image::ImageError> for TextureError {
    fn from(err: image::ImageError) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Decoded pixel data ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpuTexture {
    pub name: Option<String>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub data: Vec<u8>,
}

impl CpuTexture {
    /// Wrap raw pixel data.
    ///
    /// # Panics
    ///
    /// Panics if `data` does not hold exactly `width * height` texels.
    pub fn new(width: u32, height: u32, format: TextureFormat, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            width as usize * height as usize * format.bytes_per_pixel(),
            "texture data size does not match {width}x{height} {format:?}"
        );
        Self {
            name: None,
            width,
            height,
            format,
            data,
        }
    }

    /// A 1x1 texture of a single colour.
    pub fn solid_color(color: [u8; 4]) -> Self {
        Self::new(1, 1, TextureFormat::Rgba8Unorm, color.to_vec())
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Decode an encoded image (PNG, JPEG) into RGBA8.
    #[cfg(feature = "import")]
    pub fn decode(bytes: &[u8]) -> Result<Self, TextureError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self::new(
            width,
            height,
            TextureFormat::Rgba8UnormSrgb,
            rgba.into_raw(),
        ))
    }

    /// Read and decode an image file. The file name becomes the texture name.
    #[cfg(feature = "import")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| TextureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        Ok(Self::decode(&bytes)?.with_name(name))
    }

    /// Size of the pixel data in bytes.
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }
}
