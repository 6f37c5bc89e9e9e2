//! Shader loading and reflection.
//!
//! Shaders are written in WGSL and parsed and validated with naga. The
//! material layer never hard-codes a layout: it reads the reflected uniform
//! blocks and texture resources from the [`Shader`].
//!
//! # Bind group conventions
//!
//! | group | contents |
//! |-------|----------|
//! | 0 | per-frame data (camera) |
//! | 1 | material uniforms and textures |
//! | 2 | per-draw data (bone transforms) |
//!
//! Only uniform buffers in [`MATERIAL_GROUP`] become material uniform blocks.
//! The vertex-stage block is the first material uniform used by the vertex
//! entry point; the pixel-stage block is the first other one used by the
//! fragment entry point.
//!
//! # Example
//!
//! ```ignore
//! let shader = Shader::from_wgsl("pbr_static", PBR_STATIC_SOURCE)?;
//! let block = shader.pixel_uniform_block().unwrap();
//! let albedo = block.find("uMaterialUniforms.AlbedoColor").unwrap();
//! assert_eq!(albedo.offset, 0);
//! ```

pub mod library;

use std::sync::{Arc, Weak};

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, ScalarKind, TypeInner, VectorSize};
use parking_lot::{Mutex, RwLock};

use crate::backend::ShaderStage;
use crate::error::GraphicsError;
use crate::materials::Material;

pub use library::ShaderLibrary;

/// Bind group holding per-frame data.
pub const FRAME_GROUP: u32 = 0;
/// Bind group holding material uniforms and textures.
pub const MATERIAL_GROUP: u32 = 1;
/// Bind group holding per-draw data.
pub const DRAW_GROUP: u32 = 2;

/// Type of a reflected uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderUniformType {
    Bool,
    Int,
    UInt,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
    Struct,
    Array,
    Other,
}

/// One named uniform inside a uniform block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderUniformDeclaration {
    /// Fully qualified name, `"<block variable>.<member>"`.
    pub name: String,
    /// Byte offset inside the block.
    pub offset: u32,
    /// Size in bytes.
    pub size: u32,
    pub ty: ShaderUniformType,
    pub stage: ShaderStage,
}

/// A reflected uniform buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderUniformBlock {
    /// Name of the uniform variable.
    pub name: String,
    pub binding: u32,
    /// Size in bytes including trailing padding.
    pub size: u32,
    pub declarations: Vec<ShaderUniformDeclaration>,
}

impl ShaderUniformBlock {
    /// Find a declaration by its fully qualified name.
    pub fn find(&self, name: &str) -> Option<&ShaderUniformDeclaration> {
        self.declarations.iter().find(|d| d.name == name)
    }
}

/// A reflected texture binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderResourceDeclaration {
    pub name: String,
    /// Texture slot, equal to the binding index.
    pub slot: u32,
    /// Number of textures (greater than 1 for binding arrays).
    pub count: u32,
}

/// Everything the material layer needs to know about a shader's layout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderReflection {
    pub vertex_uniforms: Option<ShaderUniformBlock>,
    pub pixel_uniforms: Option<ShaderUniformBlock>,
    /// Texture bindings, ordered by group then binding.
    pub resources: Vec<ShaderResourceDeclaration>,
}

impl ShaderReflection {
    /// Uniform block of one stage.
    pub fn uniform_block(&self, stage: ShaderStage) -> Option<&ShaderUniformBlock> {
        match stage {
            ShaderStage::Vertex => self.vertex_uniforms.as_ref(),
            ShaderStage::Pixel => self.pixel_uniforms.as_ref(),
        }
    }

    /// Find a uniform by name, searching the vertex stage first.
    pub fn find_uniform(&self, name: &str) -> Option<&ShaderUniformDeclaration> {
        [ShaderStage::Vertex, ShaderStage::Pixel]
            .into_iter()
            .filter_map(|stage| self.uniform_block(stage))
            .find_map(|block| block.find(name))
    }

    /// Find a texture resource by name, with its position in the table.
    pub fn find_resource(&self, name: &str) -> Option<(usize, &ShaderResourceDeclaration)> {
        self.resources
            .iter()
            .enumerate()
            .find(|(_, resource)| resource.name == name)
    }

    /// Size of the uniform block of one stage, 0 when the stage has none.
    pub fn uniform_size(&self, stage: ShaderStage) -> usize {
        self.uniform_block(stage).map_or(0, |block| block.size as usize)
    }
}

/// A compiled and reflected shader.
///
/// Materials built on a shader register themselves with it and are
/// notified when the shader is [reloaded](Self::reload).
pub struct Shader {
    name: String,
    reflection: RwLock<Arc<ShaderReflection>>,
    materials: Mutex<Vec<Weak<Material>>>,
}

impl Shader {
    /// Parse, validate and reflect a WGSL shader.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::Shader`] if the source does not parse or
    /// validate.
    pub fn from_wgsl(name: impl Into<String>, source: &str) -> Result<Arc<Self>, GraphicsError> {
        let name = name.into();
        let reflection = reflect_wgsl(&name, source)?;
        log::trace!(
            "Shader '{}': {} vertex uniforms, {} pixel uniforms, {} resources",
            name,
            reflection
                .vertex_uniforms
                .as_ref()
                .map_or(0, |b| b.declarations.len()),
            reflection
                .pixel_uniforms
                .as_ref()
                .map_or(0, |b| b.declarations.len()),
            reflection.resources.len()
        );
        Ok(Arc::new(Self {
            name,
            reflection: RwLock::new(Arc::new(reflection)),
            materials: Mutex::new(Vec::new()),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the current reflection.
    pub fn reflection(&self) -> Arc<ShaderReflection> {
        Arc::clone(&self.reflection.read())
    }

    pub fn has_vertex_uniform_block(&self) -> bool {
        self.reflection.read().vertex_uniforms.is_some()
    }

    pub fn has_pixel_uniform_block(&self) -> bool {
        self.reflection.read().pixel_uniforms.is_some()
    }

    pub fn vertex_uniform_block(&self) -> Option<ShaderUniformBlock> {
        self.reflection.read().vertex_uniforms.clone()
    }

    pub fn pixel_uniform_block(&self) -> Option<ShaderUniformBlock> {
        self.reflection.read().pixel_uniforms.clone()
    }

    pub fn resource_declarations(&self) -> Vec<ShaderResourceDeclaration> {
        self.reflection.read().resources.clone()
    }

    /// Number of live materials built on this shader.
    pub fn material_count(&self) -> usize {
        self.materials
            .lock()
            .iter()
            .filter(|m| m.strong_count() > 0)
            .count()
    }

    /// Replace the shader source and notify every live material.
    ///
    /// Materials reallocate their uniform storage for the new layout and
    /// their instances lose every override.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::Shader`] if the new source is invalid; the
    /// previous layout stays active and no material is notified.
    pub fn reload(&self, source: &str) -> Result<(), GraphicsError> {
        let reflection = match reflect_wgsl(&self.name, source) {
            Ok(reflection) => reflection,
            Err(e) => {
                log::error!("Shader '{}': reload failed: {}", self.name, e);
                return Err(e);
            }
        };
        *self.reflection.write() = Arc::new(reflection);

        let materials: Vec<Arc<Material>> = {
            let mut registered = self.materials.lock();
            registered.retain(|m| m.strong_count() > 0);
            registered.iter().filter_map(Weak::upgrade).collect()
        };

        log::info!(
            "Shader '{}' reloaded, updating {} material(s)",
            self.name,
            materials.len()
        );
        for material in materials {
            material.on_shader_reloaded();
        }
        Ok(())
    }

    pub(crate) fn register_material(&self, material: &Arc<Material>) {
        let mut registered = self.materials.lock();
        registered.retain(|m| m.strong_count() > 0);
        registered.push(Arc::downgrade(material));
    }
}

impl std::fmt::Debug for Shader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shader")
            .field("name", &self.name)
            .field("materials", &self.material_count())
            .finish()
    }
}

static_assertions::assert_impl_all!(Shader: Send, Sync);

/// Parse and validate WGSL, then reflect the material layout.
fn reflect_wgsl(name: &str, source: &str) -> Result<ShaderReflection, GraphicsError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| GraphicsError::Shader(format!("{name}: {}", e.emit_to_string(source))))?;

    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
    let info = validator
        .validate(&module)
        .map_err(|e| GraphicsError::Shader(format!("{name}: {}", e.emit_to_string(source))))?;

    let mut layouter = naga::proc::Layouter::default();
    layouter
        .update(module.to_ctx())
        .map_err(|e| GraphicsError::Shader(format!("{name}: {e}")))?;

    let reflector = Reflector {
        module: &module,
        info: &info,
        layouter: &layouter,
    };

    let vertex_uniforms = reflector.stage_block(ShaderStage::Vertex, None);
    let pixel_uniforms = reflector.stage_block(
        ShaderStage::Pixel,
        vertex_uniforms.as_ref().map(|b| b.name.as_str()),
    );

    Ok(ShaderReflection {
        vertex_uniforms,
        pixel_uniforms,
        resources: reflector.resources(),
    })
}

struct Reflector<'a> {
    module: &'a naga::Module,
    info: &'a naga::valid::ModuleInfo,
    layouter: &'a naga::proc::Layouter,
}

impl Reflector<'_> {
    fn stage_block(&self, stage: ShaderStage, exclude: Option<&str>) -> Option<ShaderUniformBlock> {
        let naga_stage = match stage {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Pixel => naga::ShaderStage::Fragment,
        };
        let (index, _) = self
            .module
            .entry_points
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.stage == naga_stage)?;
        let function_info = self.info.get_entry_point(index);

        self.module
            .global_variables
            .iter()
            .filter(|(_, var)| var.space == AddressSpace::Uniform)
            .filter(|(_, var)| {
                var.binding
                    .as_ref()
                    .is_some_and(|b| b.group == MATERIAL_GROUP)
            })
            .filter(|(handle, _)| !function_info[*handle].is_empty())
            .filter(|(_, var)| exclude.is_none() || var.name.as_deref() != exclude)
            .min_by_key(|(_, var)| var.binding.as_ref().map_or(0, |b| b.binding))
            .map(|(_, var)| self.block(var, stage))
    }

    fn block(&self, var: &naga::GlobalVariable, stage: ShaderStage) -> ShaderUniformBlock {
        let var_name = var.name.clone().unwrap_or_default();
        let binding = var.binding.as_ref().map_or(0, |b| b.binding);

        let (size, declarations) = match &self.module.types[var.ty].inner {
            TypeInner::Struct { members, span } => {
                let declarations = members
                    .iter()
                    .map(|member| ShaderUniformDeclaration {
                        name: format!("{}.{}", var_name, member.name.as_deref().unwrap_or("")),
                        offset: member.offset,
                        size: self.layouter[member.ty].size,
                        ty: uniform_type(&self.module.types[member.ty].inner),
                        stage,
                    })
                    .collect();
                (*span, declarations)
            }
            inner => {
                let size = self.layouter[var.ty].size;
                let declaration = ShaderUniformDeclaration {
                    name: var_name.clone(),
                    offset: 0,
                    size,
                    ty: uniform_type(inner),
                    stage,
                };
                (size, vec![declaration])
            }
        };

        ShaderUniformBlock {
            name: var_name,
            binding,
            size,
            declarations,
        }
    }

    fn resources(&self) -> Vec<ShaderResourceDeclaration> {
        let mut resources: Vec<(u32, ShaderResourceDeclaration)> = self
            .module
            .global_variables
            .iter()
            .filter(|(_, var)| var.space == AddressSpace::Handle)
            .filter_map(|(_, var)| {
                let binding = var.binding.as_ref()?;
                let count = match &self.module.types[var.ty].inner {
                    TypeInner::Image { .. } => 1,
                    TypeInner::BindingArray { base, size }
                        if matches!(self.module.types[*base].inner, TypeInner::Image { .. }) =>
                    {
                        match size {
                            naga::ArraySize::Constant(n) => n.get(),
                            _ => 1,
                        }
                    }
                    _ => return None,
                };
                let resource = ShaderResourceDeclaration {
                    name: var.name.clone().unwrap_or_default(),
                    slot: binding.binding,
                    count,
                };
                Some((binding.group, resource))
            })
            .collect();
        resources.sort_by_key(|(group, resource)| (*group, resource.slot));
        resources.into_iter().map(|(_, resource)| resource).collect()
    }
}

fn uniform_type(inner: &TypeInner) -> ShaderUniformType {
    match *inner {
        TypeInner::Scalar(scalar) => match scalar.kind {
            ScalarKind::Bool => ShaderUniformType::Bool,
            ScalarKind::Sint => ShaderUniformType::Int,
            ScalarKind::Uint => ShaderUniformType::UInt,
            ScalarKind::Float => ShaderUniformType::Float,
            _ => ShaderUniformType::Other,
        },
        TypeInner::Vector { size, scalar } if scalar.kind == ScalarKind::Float => match size {
            VectorSize::Bi => ShaderUniformType::Vec2,
            VectorSize::Tri => ShaderUniformType::Vec3,
            VectorSize::Quad => ShaderUniformType::Vec4,
        },
        TypeInner::Matrix {
            columns: VectorSize::Tri,
            rows: VectorSize::Tri,
            ..
        } => ShaderUniformType::Mat3,
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            ..
        } => ShaderUniformType::Mat4,
        TypeInner::Struct { .. } => ShaderUniformType::Struct,
        TypeInner::Array { .. } => ShaderUniformType::Array,
        _ => ShaderUniformType::Other,
    }
}
