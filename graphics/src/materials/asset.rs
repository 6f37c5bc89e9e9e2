//! Standard PBR material assets.
//!
//! [`MaterialAsset`] wraps a [`Material`] or a [`MaterialInstance`] of one of
//! the standard PBR shaders and gives typed access to its parameters.

use std::sync::Arc;

use bytemuck::Pod;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::Texture;
use crate::shader::Shader;

use super::instance::MaterialInstance;
use super::material::Material;

pub const ALBEDO_COLOR_UNIFORM: &str = "uMaterialUniforms.AlbedoColor";
pub const METALNESS_UNIFORM: &str = "uMaterialUniforms.Metalness";
pub const ROUGHNESS_UNIFORM: &str = "uMaterialUniforms.Roughness";
pub const EMISSION_UNIFORM: &str = "uMaterialUniforms.Emission";
pub const USE_NORMAL_MAP_UNIFORM: &str = "uMaterialUniforms.UseNormalMap";

pub const ALBEDO_TEXTURE: &str = "uAlbedoTexture";
pub const NORMAL_TEXTURE: &str = "uNormalTexture";
pub const METALNESS_TEXTURE: &str = "uMetalnessTexture";
pub const ROUGHNESS_TEXTURE: &str = "uRoughnessTexture";

/// Either a base material or an instance of one.
#[derive(Debug, Clone)]
pub enum MaterialHandle {
    Base(Arc<Material>),
    Instance(Arc<MaterialInstance>),
}

impl MaterialHandle {
    /// Set a uniform value. See [`Material::set`] and [`MaterialInstance::set`].
    pub fn set<T: Pod>(&self, name: &str, value: T) {
        match self {
            Self::Base(material) => material.set(name, value),
            Self::Instance(instance) => instance.set(name, value),
        }
    }

    pub fn get<T: Pod>(&self, name: &str) -> T {
        match self {
            Self::Base(material) => material.get(name),
            Self::Instance(instance) => instance.get(name),
        }
    }

    pub fn set_texture(&self, name: &str, texture: Arc<Texture>) {
        match self {
            Self::Base(material) => material.set_texture(name, texture),
            Self::Instance(instance) => instance.set_texture(name, texture),
        }
    }

    pub fn texture(&self, name: &str) -> Option<Arc<Texture>> {
        match self {
            Self::Base(material) => material.texture(name),
            Self::Instance(instance) => instance.texture(name),
        }
    }

    pub fn bind(&self) -> Result<(), GraphicsError> {
        match self {
            Self::Base(material) => material.bind(),
            Self::Instance(instance) => instance.bind(),
        }
    }

    /// The base material (the parent, for an instance).
    pub fn material(&self) -> &Arc<Material> {
        match self {
            Self::Base(material) => material,
            Self::Instance(instance) => instance.parent(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Base(material) => material.name(),
            Self::Instance(instance) => instance.name(),
        }
    }
}

/// A standard PBR material with typed parameter access.
///
/// Cloning a `MaterialAsset` shares the underlying material.
#[derive(Debug, Clone)]
pub struct MaterialAsset {
    handle: MaterialHandle,
}

impl MaterialAsset {
    /// Create a material with default parameters: white albedo, no emission,
    /// no metalness, full roughness, and flat textures on every channel
    /// (black for metalness).
    pub fn new(device: &Arc<GraphicsDevice>, shader: &Arc<Shader>, name: impl Into<String>) -> Self {
        let asset = Self {
            handle: MaterialHandle::Base(Material::with_name(device, shader, name)),
        };
        asset.set_albedo_color([1.0, 1.0, 1.0]);
        asset.set_emission(0.0);
        asset.set_metalness(0.0);
        asset.set_roughness(1.0);
        asset.set_use_normal_map(false);
        asset.set_albedo_map(device.white_texture().clone());
        asset.set_normal_map(device.white_texture().clone());
        asset.set_roughness_map(device.white_texture().clone());
        asset.set_metalness_map(device.black_texture().clone());
        asset
    }

    /// Wrap an existing material or instance.
    pub fn from_handle(handle: MaterialHandle) -> Self {
        Self { handle }
    }

    /// A new asset backed by an instance of this asset's base material.
    pub fn create_instance(&self, name: impl Into<String>) -> Self {
        Self {
            handle: MaterialHandle::Instance(MaterialInstance::with_name(
                self.handle.material(),
                name,
            )),
        }
    }

    pub fn handle(&self) -> &MaterialHandle {
        &self.handle
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn is_instance(&self) -> bool {
        matches!(self.handle, MaterialHandle::Instance(_))
    }

    pub fn albedo_color(&self) -> [f32; 3] {
        self.handle.get(ALBEDO_COLOR_UNIFORM)
    }

    pub fn set_albedo_color(&self, color: [f32; 3]) {
        self.handle.set(ALBEDO_COLOR_UNIFORM, color);
    }

    pub fn metalness(&self) -> f32 {
        self.handle.get(METALNESS_UNIFORM)
    }

    pub fn set_metalness(&self, metalness: f32) {
        self.handle.set(METALNESS_UNIFORM, metalness);
    }

    pub fn roughness(&self) -> f32 {
        self.handle.get(ROUGHNESS_UNIFORM)
    }

    pub fn set_roughness(&self, roughness: f32) {
        self.handle.set(ROUGHNESS_UNIFORM, roughness);
    }

    pub fn emission(&self) -> f32 {
        self.handle.get(EMISSION_UNIFORM)
    }

    pub fn set_emission(&self, emission: f32) {
        self.handle.set(EMISSION_UNIFORM, emission);
    }

    pub fn use_normal_map(&self) -> bool {
        self.handle.get::<u32>(USE_NORMAL_MAP_UNIFORM) != 0
    }

    pub fn set_use_normal_map(&self, enabled: bool) {
        self.handle.set(USE_NORMAL_MAP_UNIFORM, u32::from(enabled));
    }

    pub fn albedo_map(&self) -> Option<Arc<Texture>> {
        self.handle.texture(ALBEDO_TEXTURE)
    }

    pub fn set_albedo_map(&self, texture: Arc<Texture>) {
        self.handle.set_texture(ALBEDO_TEXTURE, texture);
    }

    pub fn normal_map(&self) -> Option<Arc<Texture>> {
        self.handle.texture(NORMAL_TEXTURE)
    }

    pub fn set_normal_map(&self, texture: Arc<Texture>) {
        self.handle.set_texture(NORMAL_TEXTURE, texture);
    }

    pub fn metalness_map(&self) -> Option<Arc<Texture>> {
        self.handle.texture(METALNESS_TEXTURE)
    }

    pub fn set_metalness_map(&self, texture: Arc<Texture>) {
        self.handle.set_texture(METALNESS_TEXTURE, texture);
    }

    pub fn roughness_map(&self) -> Option<Arc<Texture>> {
        self.handle.texture(ROUGHNESS_TEXTURE)
    }

    pub fn set_roughness_map(&self, texture: Arc<Texture>) {
        self.handle.set_texture(ROUGHNESS_TEXTURE, texture);
    }

    /// Upload uniforms and bind textures.
    pub fn bind(&self) -> Result<(), GraphicsError> {
        self.handle.bind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;
    use crate::shader::ShaderLibrary;

    fn setup() -> (Arc<GraphicsDevice>, ShaderLibrary) {
        let backend = Arc::new(DummyBackend::new());
        let device = GraphicsDevice::new(backend).unwrap();
        (device, ShaderLibrary::with_standard_shaders().unwrap())
    }

    #[test]
    fn test_defaults() {
        let (device, library) = setup();
        let asset = MaterialAsset::new(&device, library.pbr(false).unwrap(), "default");
        assert_eq!(asset.name(), "default");
        assert_eq!(asset.albedo_color(), [1.0, 1.0, 1.0]);
        assert_eq!(asset.roughness(), 1.0);
        assert_eq!(asset.metalness(), 0.0);
        assert!(!asset.use_normal_map());
        assert_eq!(
            asset.albedo_map().unwrap().id(),
            device.white_texture().id()
        );
        assert_eq!(
            asset.metalness_map().unwrap().id(),
            device.black_texture().id()
        );
    }

    #[test]
    fn test_instance_asset_overrides() {
        let (device, library) = setup();
        let base = MaterialAsset::new(&device, library.pbr(true).unwrap(), "skin");
        let variant = base.create_instance("skin_red");
        assert!(variant.is_instance());

        variant.set_albedo_color([1.0, 0.0, 0.0]);
        variant.set_use_normal_map(true);
        assert_eq!(base.albedo_color(), [1.0, 1.0, 1.0]);
        assert!(!base.use_normal_map());
        assert_eq!(variant.albedo_color(), [1.0, 0.0, 0.0]);

        base.set_roughness(0.3);
        assert_eq!(variant.roughness(), 0.3);
        assert_eq!(
            variant.albedo_map().unwrap().id(),
            device.white_texture().id()
        );
    }
}
