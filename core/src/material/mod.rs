//! CPU-side material descriptions produced by the importer.
//!
//! A [`MaterialDescription`] holds the scalar parameters and texture
//! references of one imported material. The graphics crate turns it into a
//! GPU material, loading each texture channel independently and falling back
//! to flat textures and scalars when a map is missing.

use std::path::PathBuf;

/// Albedo used when the source material has no diffuse color.
pub const DEFAULT_ALBEDO: [f32; 3] = [0.8, 0.8, 0.8];

/// Shininess assumed when the source material has none.
pub const DEFAULT_SHININESS: f32 = 80.0;

/// Metalness assumed when the source material has no reflectivity.
pub const DEFAULT_METALNESS: f32 = 0.0;

/// Roughness of the material created for files without materials.
pub const DEFAULT_ROUGHNESS: f32 = 0.8;

/// Convert a Phong shininess exponent to a PBR roughness.
///
/// `roughness = 1 - sqrt(shininess / 100)`, clamped to `[0, 1]`.
pub fn roughness_from_shininess(shininess: f32) -> f32 {
    (1.0 - (shininess.max(0.0) / 100.0).sqrt()).clamp(0.0, 1.0)
}

/// Where a texture's pixels come from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TextureSource {
    /// A file on disk, already resolved against the model's directory.
    File(PathBuf),
    /// Encoded image bytes embedded in the model file.
    Embedded {
        /// Image name from the source file, if any.
        name: Option<String>,
        /// Encoded (PNG/JPEG) bytes.
        data: Vec<u8>,
    },
}

impl TextureSource {
    /// Short human-readable label for logging.
    pub fn label(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Embedded { name, data } => match name {
                Some(name) => format!("embedded '{name}'"),
                None => format!("embedded image ({} bytes)", data.len()),
            },
        }
    }
}

/// Texture channels of the standard PBR material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureChannel {
    Albedo,
    Normal,
    Roughness,
    Metalness,
}

impl TextureChannel {
    pub const ALL: [TextureChannel; 4] = [
        TextureChannel::Albedo,
        TextureChannel::Normal,
        TextureChannel::Roughness,
        TextureChannel::Metalness,
    ];
}

/// Parameters of one imported material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDescription {
    /// Material name, if any.
    pub name: Option<String>,
    /// Diffuse color (RGB).
    pub albedo_color: [f32; 3],
    /// Emission strength.
    pub emission: f32,
    /// Phong shininess exponent, if the source format has one.
    pub shininess: Option<f32>,
    /// Explicit roughness, if the source format has one. Takes precedence
    /// over `shininess`.
    pub roughness: Option<f32>,
    /// Metalness (from reflectivity or a metallic factor).
    pub metalness: f32,
    pub albedo_texture: Option<TextureSource>,
    pub normal_texture: Option<TextureSource>,
    pub roughness_texture: Option<TextureSource>,
    pub metalness_texture: Option<TextureSource>,
}

impl MaterialDescription {
    /// A material with every parameter at its import default.
    pub fn new() -> Self {
        Self {
            name: None,
            albedo_color: DEFAULT_ALBEDO,
            emission: 0.0,
            shininess: None,
            roughness: None,
            metalness: DEFAULT_METALNESS,
            albedo_texture: None,
            normal_texture: None,
            roughness_texture: None,
            metalness_texture: None,
        }
    }

    /// The material assigned to meshes of files that declare none.
    pub fn fallback() -> Self {
        Self::new()
            .with_name("default")
            .with_roughness(DEFAULT_ROUGHNESS)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_albedo_color(mut self, color: [f32; 3]) -> Self {
        self.albedo_color = color;
        self
    }

    #[must_use]
    pub fn with_emission(mut self, emission: f32) -> Self {
        self.emission = emission;
        self
    }

    #[must_use]
    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = Some(shininess);
        self
    }

    #[must_use]
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = Some(roughness);
        self
    }

    #[must_use]
    pub fn with_metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness;
        self
    }

    /// Set the texture for one channel.
    #[must_use]
    pub fn with_texture(mut self, channel: TextureChannel, source: TextureSource) -> Self {
        *self.texture_slot_mut(channel) = Some(source);
        self
    }

    /// Texture reference of a channel.
    pub fn texture(&self, channel: TextureChannel) -> Option<&TextureSource> {
        match channel {
            TextureChannel::Albedo => self.albedo_texture.as_ref(),
            TextureChannel::Normal => self.normal_texture.as_ref(),
            TextureChannel::Roughness => self.roughness_texture.as_ref(),
            TextureChannel::Metalness => self.metalness_texture.as_ref(),
        }
    }

    fn texture_slot_mut(&mut self, channel: TextureChannel) -> &mut Option<TextureSource> {
        match channel {
            TextureChannel::Albedo => &mut self.albedo_texture,
            TextureChannel::Normal => &mut self.normal_texture,
            TextureChannel::Roughness => &mut self.roughness_texture,
            TextureChannel::Metalness => &mut self.metalness_texture,
        }
    }

    /// Roughness to use: the explicit value, else derived from shininess
    /// (default [`DEFAULT_SHININESS`]).
    pub fn resolved_roughness(&self) -> f32 {
        match self.roughness {
            Some(r) => r,
            None => roughness_from_shininess(self.shininess.unwrap_or(DEFAULT_SHININESS)),
        }
    }
}

impl Default for MaterialDescription {
    fn default() -> Self {
        Self::new()
    }
}
