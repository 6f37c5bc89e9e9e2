//! Material instance with per-use overrides.
//!
//! A [`MaterialInstance`] starts as a copy of its parent [`Material`]'s
//! uniforms. Names written on the instance are marked overridden; every other
//! name keeps following the parent.

use std::collections::HashSet;
use std::sync::Arc;

use bytemuck::Pod;
use parking_lot::RwLock;

use crate::error::GraphicsError;
use crate::resources::Texture;
use crate::shader::ShaderUniformDeclaration;

use super::material::{Material, UniformStorage, read_value, value_bytes};

struct InstanceState {
    uniforms: UniformStorage,
    overridden: HashSet<String>,
    /// Texture overrides, parallel to `uniforms.layout.resources`.
    textures: Vec<Option<Arc<Texture>>>,
}

impl InstanceState {
    fn from_parent(parent: &Material) -> Self {
        let uniforms = parent.uniforms();
        let textures = vec![None; uniforms.layout.resources.len()];
        Self {
            uniforms,
            overridden: HashSet::new(),
            textures,
        }
    }
}

/// An override layer over a shared [`Material`].
///
/// The instance owns a strong reference to its parent and registers itself
/// in the parent's instance set until it is dropped.
pub struct MaterialInstance {
    name: String,
    parent: Arc<Material>,
    state: RwLock<InstanceState>,
}

impl MaterialInstance {
    /// Create an instance of `parent`, named after it.
    pub fn new(parent: &Arc<Material>) -> Arc<Self> {
        Self::with_name(parent, parent.name())
    }

    pub fn with_name(parent: &Arc<Material>, name: impl Into<String>) -> Arc<Self> {
        let instance = Arc::new(Self {
            name: name.into(),
            parent: Arc::clone(parent),
            state: RwLock::new(InstanceState::from_parent(parent)),
        });
        parent.register_instance(&instance);
        instance
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> &Arc<Material> {
        &self.parent
    }

    /// Override a uniform value.
    ///
    /// The first write to a name copies the parent's current bytes for the
    /// whole uniform before writing `value`.
    ///
    /// # Panics
    ///
    /// Panics if the shader declares no uniform called `name`, or if `T` is
    /// larger than the declared uniform.
    pub fn set<T: Pod>(&self, name: &str, value: T) {
        let declaration = self
            .state
            .read()
            .uniforms
            .declaration(name, self.parent.shader().name());
        let bytes = value_bytes(&value, &declaration);
        let parent_bytes = self.parent.uniform_bytes(&declaration);

        let mut state = self.state.write();
        if state.overridden.insert(declaration.name.clone()) {
            state.uniforms.write(&declaration, &parent_bytes);
        }
        state.uniforms.write(&declaration, bytes);
    }

    /// Read a uniform value as seen by this instance.
    ///
    /// # Panics
    ///
    /// Panics if the shader declares no uniform called `name`, or if `T` is
    /// larger than the declared uniform.
    pub fn get<T: Pod>(&self, name: &str) -> T {
        let state = self.state.read();
        let declaration = state
            .uniforms
            .declaration(name, self.parent.shader().name());
        read_value(state.uniforms.read(&declaration), &declaration)
    }

    pub fn is_overridden(&self, name: &str) -> bool {
        self.state.read().overridden.contains(name)
    }

    pub fn override_count(&self) -> usize {
        self.state.read().overridden.len()
    }

    /// Override the texture of the named resource.
    ///
    /// # Panics
    ///
    /// Panics if the shader declares no texture called `name`.
    pub fn set_texture(&self, name: &str, texture: Arc<Texture>) {
        let mut state = self.state.write();
        let index = match state.uniforms.layout.find_resource(name) {
            Some((index, _)) => index,
            None => panic!(
                "texture '{name}' is not declared by shader '{}'",
                self.parent.shader().name()
            ),
        };
        state.textures[index] = Some(texture);
    }

    /// Texture of the named resource: the override, else the parent's.
    pub fn texture(&self, name: &str) -> Option<Arc<Texture>> {
        let index = {
            let state = self.state.read();
            let (index, _) = state.uniforms.layout.find_resource(name)?;
            if let Some(texture) = &state.textures[index] {
                return Some(Arc::clone(texture));
            }
            index
        };
        self.parent.textures().get(index).cloned().flatten()
    }

    /// Upload this instance's uniforms, then bind textures in table order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects a command.
    pub fn bind(&self) -> Result<(), GraphicsError> {
        let device = self.parent.device();
        let parent_textures = self.parent.textures();
        let state = self.state.read();

        device.bind_shader(self.parent.shader().name())?;
        state.uniforms.upload(device)?;

        for (index, resource) in state.uniforms.layout.resources.iter().enumerate() {
            let texture = state.textures[index]
                .as_ref()
                .or_else(|| parent_textures.get(index).and_then(Option::as_ref));
            if let Some(texture) = texture {
                device.bind_texture(texture, resource.slot)?;
            }
        }
        Ok(())
    }

    pub(crate) fn on_parent_value_changed(
        &self,
        declaration: &ShaderUniformDeclaration,
        bytes: &[u8],
    ) {
        let mut state = self.state.write();
        if !state.overridden.contains(&declaration.name) {
            state.uniforms.write(declaration, bytes);
        }
    }

    pub(crate) fn on_parent_reloaded(&self) {
        *self.state.write() = InstanceState::from_parent(&self.parent);
    }
}

impl Drop for MaterialInstance {
    fn drop(&mut self) {
        self.parent.unregister_instance(self as *const Self);
    }
}

impl std::fmt::Debug for MaterialInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialInstance")
            .field("name", &self.name)
            .field("parent", &self.parent.name())
            .field("overrides", &self.override_count())
            .finish()
    }
}

static_assertions::assert_impl_all!(MaterialInstance: Send, Sync);
