//! Base material.
//!
//! A [`Material`] owns the uniform storage of a shader's reflected layout and
//! the textures bound to its texture slots. Values are addressed by name.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use bytemuck::Pod;
use parking_lot::{Mutex, RwLock};

use crate::backend::ShaderStage;
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::Texture;
use crate::shader::{Shader, ShaderReflection, ShaderUniformDeclaration};

use super::instance::MaterialInstance;

/// Uniform bytes of both stages laid out for one reflection.
#[derive(Debug, Clone)]
pub(crate) struct UniformStorage {
    pub(crate) layout: Arc<ShaderReflection>,
    vertex: Vec<u8>,
    pixel: Vec<u8>,
}

impl UniformStorage {
    /// Zero-initialised storage sized for `layout`.
    pub(crate) fn zeroed(layout: Arc<ShaderReflection>) -> Self {
        let vertex = vec![0; layout.uniform_size(ShaderStage::Vertex)];
        let pixel = vec![0; layout.uniform_size(ShaderStage::Pixel)];
        Self {
            layout,
            vertex,
            pixel,
        }
    }

    pub(crate) fn buffer(&self, stage: ShaderStage) -> &[u8] {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Pixel => &self.pixel,
        }
    }

    /// Resolve a uniform name, panicking on names the shader does not declare.
    pub(crate) fn declaration(&self, name: &str, shader: &str) -> ShaderUniformDeclaration {
        match self.layout.find_uniform(name) {
            Some(declaration) => declaration.clone(),
            None => panic!("uniform '{name}' is not declared by shader '{shader}'"),
        }
    }

    pub(crate) fn read(&self, declaration: &ShaderUniformDeclaration) -> &[u8] {
        let start = declaration.offset as usize;
        &self.buffer(declaration.stage)[start..start + declaration.size as usize]
    }

    /// Write `bytes` at the start of the declaration's range.
    pub(crate) fn write(&mut self, declaration: &ShaderUniformDeclaration, bytes: &[u8]) {
        let start = declaration.offset as usize;
        let buffer = match declaration.stage {
            ShaderStage::Vertex => &mut self.vertex,
            ShaderStage::Pixel => &mut self.pixel,
        };
        buffer[start..start + bytes.len()].copy_from_slice(bytes);
    }

    /// Upload every non-empty stage buffer.
    pub(crate) fn upload(&self, device: &GraphicsDevice) -> Result<(), GraphicsError> {
        for stage in [ShaderStage::Vertex, ShaderStage::Pixel] {
            let data = self.buffer(stage);
            if !data.is_empty() {
                device.upload_uniforms(stage, data)?;
            }
        }
        Ok(())
    }
}

/// Check that a value of type `T` fits the declared uniform.
pub(crate) fn value_bytes<'a, T: Pod>(
    value: &'a T,
    declaration: &ShaderUniformDeclaration,
) -> &'a [u8] {
    let bytes = bytemuck::bytes_of(value);
    assert!(
        bytes.len() <= declaration.size as usize,
        "value of {} bytes does not fit uniform '{}' ({} bytes)",
        bytes.len(),
        declaration.name,
        declaration.size
    );
    bytes
}

/// Read a `T` from the start of a uniform's bytes.
pub(crate) fn read_value<T: Pod>(bytes: &[u8], declaration: &ShaderUniformDeclaration) -> T {
    let size = std::mem::size_of::<T>();
    assert!(
        size <= bytes.len(),
        "uniform '{}' ({} bytes) cannot be read as a {}-byte value",
        declaration.name,
        bytes.len(),
        size
    );
    bytemuck::pod_read_unaligned(&bytes[..size])
}

struct MaterialStorage {
    uniforms: UniformStorage,
    /// Bound textures, parallel to `uniforms.layout.resources`.
    textures: Vec<Option<Arc<Texture>>>,
}

/// A shader plus named uniform values and bound textures.
///
/// Materials register with their shader and are reallocated when it is
/// reloaded. [`MaterialInstance`]s created from a material hold a strong
/// reference to it; the material only keeps weak references back.
///
/// # Example
///
/// ```ignore
/// let material = Material::new(&device, library.pbr(false)?);
/// material.set("uMaterialUniforms.AlbedoColor", [1.0f32, 0.5, 0.2]);
/// material.set_texture("uAlbedoTexture", texture);
/// material.bind()?;
/// ```
pub struct Material {
    name: String,
    device: Arc<GraphicsDevice>,
    shader: Arc<Shader>,
    storage: RwLock<MaterialStorage>,
    instances: Mutex<Vec<Weak<MaterialInstance>>>,
}

impl Material {
    /// Create a material named after its shader.
    pub fn new(device: &Arc<GraphicsDevice>, shader: &Arc<Shader>) -> Arc<Self> {
        Self::with_name(device, shader, shader.name())
    }

    /// Create a material with an explicit name.
    pub fn with_name(
        device: &Arc<GraphicsDevice>,
        shader: &Arc<Shader>,
        name: impl Into<String>,
    ) -> Arc<Self> {
        let layout = shader.reflection();
        let textures = vec![None; layout.resources.len()];
        let material = Arc::new(Self {
            name: name.into(),
            device: Arc::clone(device),
            shader: Arc::clone(shader),
            storage: RwLock::new(MaterialStorage {
                uniforms: UniformStorage::zeroed(layout),
                textures,
            }),
            instances: Mutex::new(Vec::new()),
        });
        shader.register_material(&material);
        device.track_material(&material);
        log::trace!(
            "Material '{}' created on shader '{}'",
            material.name,
            shader.name()
        );
        material
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shader(&self) -> &Arc<Shader> {
        &self.shader
    }

    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Set a uniform value.
    ///
    /// Every instance that has not overridden `name` receives the new value.
    ///
    /// # Panics
    ///
    /// Panics if the shader declares no uniform called `name`, or if `T` is
    /// larger than the declared uniform.
    pub fn set<T: Pod>(&self, name: &str, value: T) {
        let declaration = {
            let mut storage = self.storage.write();
            let declaration = storage.uniforms.declaration(name, self.shader.name());
            let bytes = value_bytes(&value, &declaration);
            storage.uniforms.write(&declaration, bytes);
            declaration
        };

        let bytes = bytemuck::bytes_of(&value);
        for instance in self.live_instances() {
            instance.on_parent_value_changed(&declaration, bytes);
        }
    }

    /// Read a uniform value.
    ///
    /// # Panics
    ///
    /// Panics if the shader declares no uniform called `name`, or if `T` is
    /// larger than the declared uniform.
    pub fn get<T: Pod>(&self, name: &str) -> T {
        let storage = self.storage.read();
        let declaration = storage.uniforms.declaration(name, self.shader.name());
        read_value(storage.uniforms.read(&declaration), &declaration)
    }

    /// Bind a texture to the named texture resource.
    ///
    /// # Panics
    ///
    /// Panics if the shader declares no texture called `name`.
    pub fn set_texture(&self, name: &str, texture: Arc<Texture>) {
        let mut storage = self.storage.write();
        let index = match storage.uniforms.layout.find_resource(name) {
            Some((index, _)) => index,
            None => panic!(
                "texture '{name}' is not declared by shader '{}'",
                self.shader.name()
            ),
        };
        storage.textures[index] = Some(texture);
    }

    /// Texture bound to the named resource, if any.
    pub fn texture(&self, name: &str) -> Option<Arc<Texture>> {
        let storage = self.storage.read();
        let (index, _) = storage.uniforms.layout.find_resource(name)?;
        storage.textures[index].clone()
    }

    /// Raw uniform bytes of one stage.
    pub fn uniform_data(&self, stage: ShaderStage) -> Vec<u8> {
        self.storage.read().uniforms.buffer(stage).to_vec()
    }

    /// Resize the uniform storage to the shader's current layout.
    ///
    /// Uniform values are reset to zero. Textures stay bound when the new
    /// layout still declares a resource with the same name.
    pub fn allocate_storage(&self) {
        let layout = self.shader.reflection();
        let mut guard = self.storage.write();
        let storage = &mut *guard;

        let old_textures: HashMap<String, Arc<Texture>> = storage
            .uniforms
            .layout
            .resources
            .iter()
            .zip(storage.textures.drain(..))
            .filter_map(|(resource, texture)| Some((resource.name.clone(), texture?)))
            .collect();

        storage.textures = layout
            .resources
            .iter()
            .map(|resource| old_textures.get(&resource.name).cloned())
            .collect();
        storage.uniforms = UniformStorage::zeroed(layout);
    }

    /// Number of live instances of this material.
    pub fn instance_count(&self) -> usize {
        self.instances
            .lock()
            .iter()
            .filter(|i| i.strong_count() > 0)
            .count()
    }

    /// Upload the uniform buffers, then bind the textures in table order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects a command.
    pub fn bind(&self) -> Result<(), GraphicsError> {
        let storage = self.storage.read();
        self.device.bind_shader(self.shader.name())?;
        storage.uniforms.upload(&self.device)?;

        for (resource, texture) in storage
            .uniforms
            .layout
            .resources
            .iter()
            .zip(&storage.textures)
        {
            if let Some(texture) = texture {
                self.device.bind_texture(texture, resource.slot)?;
            }
        }
        Ok(())
    }

    pub(crate) fn on_shader_reloaded(&self) {
        self.allocate_storage();
        for instance in self.live_instances() {
            instance.on_parent_reloaded();
        }
        log::trace!("Material '{}' reallocated after shader reload", self.name);
    }

    /// Copy of the current uniform storage.
    pub(crate) fn uniforms(&self) -> UniformStorage {
        self.storage.read().uniforms.clone()
    }

    /// Current bytes of one uniform.
    pub(crate) fn uniform_bytes(&self, declaration: &ShaderUniformDeclaration) -> Vec<u8> {
        self.storage.read().uniforms.read(declaration).to_vec()
    }

    /// Bound textures, parallel to the layout's resources.
    pub(crate) fn textures(&self) -> Vec<Option<Arc<Texture>>> {
        self.storage.read().textures.clone()
    }

    pub(crate) fn register_instance(&self, instance: &Arc<MaterialInstance>) {
        let mut instances = self.instances.lock();
        instances.retain(|i| i.strong_count() > 0);
        instances.push(Arc::downgrade(instance));
    }

    pub(crate) fn unregister_instance(&self, instance: *const MaterialInstance) {
        self.instances
            .lock()
            .retain(|i| i.strong_count() > 0 && !std::ptr::eq(i.as_ptr(), instance));
    }

    fn live_instances(&self) -> Vec<Arc<MaterialInstance>> {
        self.instances
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("name", &self.name)
            .field("shader", &self.shader.name())
            .field("instances", &self.instance_count())
            .finish()
    }
}

static_assertions::assert_impl_all!(Material: Send, Sync);
