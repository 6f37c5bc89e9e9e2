//! Built-in shader library.
//!
//! The standard shaders are stored as `.wgsl` files in `shaders/` and
//! compiled into the crate:
//!
//! | Name | Used by |
//! |------|---------|
//! | `pbr_static` | materials of static meshes |
//! | `pbr_animated` | materials of skinned meshes |
//! | `renderer2d_quad` | batched 2D quads |
//! | `renderer2d_circle` | batched 2D circles |
//! | `renderer2d_line` | batched 2D lines |

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::GraphicsError;

use super::Shader;

pub const PBR_STATIC: &str = "pbr_static";
pub const PBR_ANIMATED: &str = "pbr_animated";
pub const RENDERER2D_QUAD: &str = "renderer2d_quad";
pub const RENDERER2D_CIRCLE: &str = "renderer2d_circle";
pub const RENDERER2D_LINE: &str = "renderer2d_line";

/// PBR material for the static vertex layout.
pub const PBR_STATIC_SOURCE: &str = include_str!("../../../shaders/pbr_static.wgsl");

/// PBR material for the skinned vertex layout.
pub const PBR_ANIMATED_SOURCE: &str = include_str!("../../../shaders/pbr_animated.wgsl");

/// Batched 2D quad shader.
pub const RENDERER2D_QUAD_SOURCE: &str = include_str!("../../../shaders/renderer2d_quad.wgsl");

/// Batched 2D circle shader.
pub const RENDERER2D_CIRCLE_SOURCE: &str =
    include_str!("../../../shaders/renderer2d_circle.wgsl");

/// Batched 2D line shader.
pub const RENDERER2D_LINE_SOURCE: &str = include_str!("../../../shaders/renderer2d_line.wgsl");

const STANDARD_SHADERS: [(&str, &str); 5] = [
    (PBR_STATIC, PBR_STATIC_SOURCE),
    (PBR_ANIMATED, PBR_ANIMATED_SOURCE),
    (RENDERER2D_QUAD, RENDERER2D_QUAD_SOURCE),
    (RENDERER2D_CIRCLE, RENDERER2D_CIRCLE_SOURCE),
    (RENDERER2D_LINE, RENDERER2D_LINE_SOURCE),
];

/// Named collection of compiled shaders.
#[derive(Debug, Default, Clone)]
pub struct ShaderLibrary {
    shaders: HashMap<String, Arc<Shader>>,
}

impl ShaderLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a library holding every standard shader.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in shader fails to compile.
    pub fn with_standard_shaders() -> Result<Self, GraphicsError> {
        let mut library = Self::new();
        for (name, source) in STANDARD_SHADERS {
            library.add(Shader::from_wgsl(name, source)?);
        }
        Ok(library)
    }

    /// Source of a standard shader.
    pub fn standard_source(name: &str) -> Option<&'static str> {
        STANDARD_SHADERS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, source)| *source)
    }

    /// Add a shader, replacing any shader with the same name.
    pub fn add(&mut self, shader: Arc<Shader>) -> Option<Arc<Shader>> {
        self.shaders.insert(shader.name().to_string(), shader)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Shader>> {
        self.shaders.get(name)
    }

    /// Get a shader that must be present.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::Shader`] if the library has no such shader.
    pub fn require(&self, name: &str) -> Result<&Arc<Shader>, GraphicsError> {
        self.get(name)
            .ok_or_else(|| GraphicsError::Shader(format!("shader '{name}' is not in the library")))
    }

    /// Standard PBR shader for the given vertex layout.
    pub fn pbr(&self, animated: bool) -> Result<&Arc<Shader>, GraphicsError> {
        self.require(if animated { PBR_ANIMATED } else { PBR_STATIC })
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    /// Names of all shaders, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.shaders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
