//! GPU-resident imported meshes.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use ember_core::import::{ImportError, ImportOptions, import_mesh};
use ember_core::material::{MaterialDescription, TextureChannel, TextureSource};
use ember_core::mesh::{MeshSource, Submesh};
use ember_core::texture::CpuTexture;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::materials::MaterialAsset;
use crate::resources::{Buffer, Texture};
use crate::shader::{Shader, ShaderLibrary};
use crate::types::{BufferDescriptor, BufferUsage};

/// Errors from [`MeshAsset::import`].
#[derive(Debug)]
pub enum MeshImportError {
    /// The file could not be imported.
    Import(ImportError),
    /// The imported data could not be uploaded.
    Graphics(GraphicsError),
}

impl fmt::Display for MeshImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import(e) => write!(f, "mesh import failed: {e}"),
            Self::Graphics(e) => write!(f, "mesh upload failed: {e}"),
        }
    }
}

impl std::error::Error for MeshImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Import(e) => Some(e),
            Self::Graphics(e) => Some(e),
        }
    }
}

impl From<ImportError> for MeshImportError {
    fn from(e: ImportError) -> Self {
        Self::Import(e)
    }
}

impl From<GraphicsError> for MeshImportError {
    fn from(e: GraphicsError) -> Self {
        Self::Graphics(e)
    }
}

/// An imported mesh with its vertex and index data on the GPU.
///
/// Immutable after construction and shared between every runtime
/// [`Mesh`](super::Mesh) that draws it. The GPU buffers are released when
/// the last reference is dropped.
pub struct MeshAsset {
    source: MeshSource,
    vertex_buffer: Arc<Buffer>,
    index_buffer: Arc<Buffer>,
    materials: Vec<MaterialAsset>,
}

impl MeshAsset {
    /// Import a model file and upload it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be imported or uploaded. Missing
    /// textures are not errors: they are logged and replaced by flat
    /// textures.
    pub fn import(
        device: &Arc<GraphicsDevice>,
        library: &ShaderLibrary,
        path: impl AsRef<Path>,
        options: &ImportOptions,
    ) -> Result<Arc<Self>, MeshImportError> {
        let source = import_mesh(path, options)?;
        Ok(Self::new(device, library, source)?)
    }

    /// Upload already imported mesh data.
    ///
    /// # Errors
    ///
    /// Returns an error if a buffer cannot be created or the PBR shader for
    /// the mesh's vertex layout is missing from `library`.
    pub fn new(
        device: &Arc<GraphicsDevice>,
        library: &ShaderLibrary,
        source: MeshSource,
    ) -> Result<Arc<Self>, GraphicsError> {
        let label = source
            .file_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "mesh".to_string());

        let vertex_buffer = device.create_buffer_init(
            &BufferDescriptor::new(source.vertices().as_bytes().len() as u64, BufferUsage::VERTEX)
                .with_label(format!("{label} vertices")),
            source.vertices().as_bytes(),
        )?;
        let index_buffer = device.create_buffer_init(
            &BufferDescriptor::new(source.index_bytes().len() as u64, BufferUsage::INDEX)
                .with_label(format!("{label} indices")),
            source.index_bytes(),
        )?;

        let shader = library.pbr(source.is_animated())?;
        let mut textures = TextureCache::default();
        let fallback = [MaterialDescription::fallback()];
        let descriptions = match source.materials() {
            [] => &fallback[..],
            materials => materials,
        };
        let materials: Vec<MaterialAsset> = descriptions
            .iter()
            .enumerate()
            .map(|(index, description)| {
                build_material(device, shader, description, index, &mut textures)
            })
            .collect();

        log::info!(
            "MeshAsset '{}': {} vertices, {} triangles, {} submeshes, {} materials",
            label,
            source.vertex_count(),
            source.triangle_count(),
            source.submeshes().len(),
            materials.len()
        );

        Ok(Arc::new(Self {
            source,
            vertex_buffer,
            index_buffer,
            materials,
        }))
    }

    /// CPU-side mesh data.
    pub fn source(&self) -> &MeshSource {
        &self.source
    }

    pub fn submeshes(&self) -> &[Submesh] {
        self.source.submeshes()
    }

    pub fn vertex_buffer(&self) -> &Arc<Buffer> {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &Arc<Buffer> {
        &self.index_buffer
    }

    /// Base materials, one per imported material.
    pub fn materials(&self) -> &[MaterialAsset] {
        &self.materials
    }

    pub fn material(&self, index: u32) -> Option<&MaterialAsset> {
        self.materials.get(index as usize)
    }

    pub fn is_animated(&self) -> bool {
        self.source.is_animated()
    }

    pub fn bone_count(&self) -> usize {
        self.source.bone_count()
    }
}

impl fmt::Debug for MeshAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshAsset")
            .field("file_path", &self.source.file_path())
            .field("vertices", &self.source.vertex_count())
            .field("submeshes", &self.source.submeshes().len())
            .field("materials", &self.materials.len())
            .finish()
    }
}

static_assertions::assert_impl_all!(MeshAsset: Send, Sync);

/// Textures loaded while building one asset's materials, by source.
/// A failed load is cached as `None` so it is only reported once.
type TextureCache = HashMap<TextureSource, Option<Arc<Texture>>>;

fn build_material(
    device: &Arc<GraphicsDevice>,
    shader: &Arc<Shader>,
    description: &MaterialDescription,
    index: usize,
    textures: &mut TextureCache,
) -> MaterialAsset {
    let name = description
        .name
        .clone()
        .unwrap_or_else(|| format!("material_{index}"));
    let material = MaterialAsset::new(device, shader, name);
    material.set_albedo_color(description.albedo_color);
    material.set_emission(description.emission);
    material.set_roughness(description.resolved_roughness());
    material.set_metalness(description.metalness);

    // Each channel falls back on its own; the defaults from
    // `MaterialAsset::new` already hold the flat textures.
    for channel in TextureChannel::ALL {
        let Some(source) = description.texture(channel) else {
            continue;
        };
        let texture = textures
            .entry(source.clone())
            .or_insert_with(|| load_texture(device, source))
            .clone();
        let Some(texture) = texture else {
            continue;
        };

        match channel {
            TextureChannel::Albedo => {
                material.set_albedo_map(texture);
                material.set_albedo_color([1.0, 1.0, 1.0]);
            }
            TextureChannel::Normal => {
                material.set_normal_map(texture);
                material.set_use_normal_map(true);
            }
            TextureChannel::Roughness => {
                material.set_roughness_map(texture);
                material.set_roughness(1.0);
            }
            TextureChannel::Metalness => {
                material.set_metalness_map(texture);
                material.set_metalness(1.0);
            }
        }
    }

    material
}

fn load_texture(device: &Arc<GraphicsDevice>, source: &TextureSource) -> Option<Arc<Texture>> {
    let decoded = match source {
        TextureSource::File(path) => CpuTexture::load(path),
        TextureSource::Embedded { data, .. } => CpuTexture::decode(data),
    };

    let texture = match decoded {
        Ok(texture) => texture.with_name(source.label()),
        Err(e) => {
            log::warn!(
                "Could not load texture {}: {}; using fallback",
                source.label(),
                e
            );
            return None;
        }
    };

    match device.create_texture_from_cpu(&texture) {
        Ok(texture) => Some(texture),
        Err(e) => {
            log::warn!(
                "Could not upload texture {}: {}; using fallback",
                source.label(),
                e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendCommand;
    use crate::materials::ALBEDO_TEXTURE;
    use crate::mesh::fixtures::{rigged_source, setup, two_part_source};
    use ember_core::import::import_mesh_from_slice;
    use ember_core::mesh::VertexData;

    /// One triangle with positions, normals and UVs and a single untextured
    /// material; `{texture}` is spliced into the material JSON.
    const TRIANGLE_GLTF: &str = r#"{
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0, "name": "triangle"}],
        "meshes": [{"name": "triangle", "primitives": [{
            "attributes": {"POSITION": 0, "NORMAL": 1, "TEXCOORD_0": 2},
            "indices": 3,
            "material": 0
        }]}],
        "materials": [{"name": "paint", "pbrMetallicRoughness": {
            "baseColorFactor": [0.2, 0.4, 0.6, 1.0],
            "metallicFactor": 0.0,
            "roughnessFactor": 0.5{texture}
        }}],
        {images}
        "buffers": [{"byteLength": 104, "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAABAAIAAAA="}],
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": 36},
            {"buffer": 0, "byteOffset": 36, "byteLength": 36},
            {"buffer": 0, "byteOffset": 72, "byteLength": 24},
            {"buffer": 0, "byteOffset": 96, "byteLength": 6}
        ],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0]},
            {"bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3"},
            {"bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC2"},
            {"bufferView": 3, "componentType": 5123, "count": 3, "type": "SCALAR"}
        ]
    }"#;

    fn triangle_gltf(texture_uri: Option<&str>) -> Vec<u8> {
        let (texture, images) = match texture_uri {
            Some(uri) => (
                r#", "baseColorTexture": {"index": 0}"#.to_string(),
                format!(r#""images": [{{"uri": "{uri}"}}], "textures": [{{"source": 0}}],"#),
            ),
            None => (String::new(), String::new()),
        };
        TRIANGLE_GLTF
            .replace("{texture}", &texture)
            .replace("{images}", &images)
            .into_bytes()
    }

    #[test]
    fn test_imported_triangle() {
        let _ = env_logger::builder().is_test(true).try_init();
        let (device, backend, library) = setup();
        let source =
            import_mesh_from_slice(&triangle_gltf(None), None, &ImportOptions::default()).unwrap();
        let asset = MeshAsset::new(&device, &library, source).unwrap();

        assert_eq!(asset.submeshes().len(), 1);
        assert_eq!(asset.source().vertex_count(), 3);
        assert_eq!(asset.source().triangle_count(), 1);
        assert!(!asset.is_animated());

        assert_eq!(asset.materials().len(), 1);
        let material = &asset.materials()[0];
        assert_eq!(material.name(), "paint");
        assert_eq!(material.albedo_color(), [0.2, 0.4, 0.6]);
        assert_eq!(material.roughness(), 0.5);
        assert_eq!(
            material.albedo_map().unwrap().id(),
            device.white_texture().id()
        );

        let created: Vec<_> = backend
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                BackendCommand::CreateBuffer { descriptor, .. } => Some(descriptor.size),
                _ => None,
            })
            .collect();
        assert_eq!(created, [3 * 56, 12]);
    }

    #[test]
    fn test_missing_texture_uses_fallback() {
        let (device, _, library) = setup();
        let source = import_mesh_from_slice(
            &triangle_gltf(Some("does_not_exist.png")),
            None,
            &ImportOptions::default(),
        )
        .unwrap();
        let asset = MeshAsset::new(&device, &library, source).unwrap();

        let material = &asset.materials()[0];
        assert_eq!(
            material.handle().texture(ALBEDO_TEXTURE).unwrap().id(),
            device.white_texture().id()
        );
        assert_eq!(material.albedo_color(), [0.2, 0.4, 0.6]);
        assert_eq!(device.texture_count(), 0);
    }

    #[test]
    fn test_loaded_texture_resets_albedo() {
        let (device, _, library) = setup();
        let png = {
            let mut bytes = Vec::new();
            let image = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]));
            image
                .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
                .unwrap();
            bytes
        };
        let source = triangle_source_with_texture(png);
        let asset = MeshAsset::new(&device, &library, source).unwrap();

        let material = &asset.materials()[0];
        assert_eq!(material.albedo_color(), [1.0, 1.0, 1.0]);
        let albedo = material.albedo_map().unwrap();
        assert_ne!(albedo.id(), device.white_texture().id());
        assert_eq!((albedo.width(), albedo.height()), (2, 2));
        assert_eq!(device.texture_count(), 1);
    }

    fn triangle_source_with_texture(png: Vec<u8>) -> MeshSource {
        use ember_core::material::MaterialDescription;
        let source = crate::mesh::fixtures::triangle_source();
        let description = MaterialDescription::new()
            .with_name("textured")
            .with_albedo_color([0.5, 0.5, 0.5])
            .with_texture(
                TextureChannel::Albedo,
                TextureSource::Embedded {
                    name: Some("albedo".into()),
                    data: png,
                },
            );
        source.with_materials(vec![description])
    }

    #[test]
    fn test_materials_follow_vertex_layout() {
        let (device, _, library) = setup();
        let animated = MeshAsset::new(&device, &library, rigged_source()).unwrap();
        assert!(animated.is_animated());
        assert_eq!(animated.bone_count(), 2);
        assert_eq!(
            animated.materials()[0].handle().material().shader().name(),
            "pbr_animated"
        );

        let fixed = MeshAsset::new(&device, &library, two_part_source()).unwrap();
        assert_eq!(
            fixed.material(1).unwrap().handle().material().shader().name(),
            "pbr_static"
        );
        assert!(fixed.material(2).is_none());
    }

    #[test]
    fn test_source_without_materials_gets_default() {
        let (device, _, library) = setup();
        let vertices = VertexData::Static(vec![Default::default(); 3]);
        let source = MeshSource::from_parts(vertices, vec![[0, 1, 2]], Vec::new());
        let asset = MeshAsset::new(&device, &library, source).unwrap();

        assert_eq!(asset.materials().len(), 1);
        assert_eq!(asset.materials()[0].name(), "default");
        assert_eq!(asset.materials()[0].roughness(), 0.8);
    }

    #[test]
    fn test_buffers_released_with_asset() {
        let (device, backend, library) = setup();
        let asset = MeshAsset::new(&device, &library, two_part_source()).unwrap();
        assert_eq!(device.buffer_count(), 2);
        backend.clear();

        drop(asset);
        let released = backend
            .commands()
            .iter()
            .filter(|c| matches!(c, BackendCommand::ReleaseBuffer { .. }))
            .count();
        assert_eq!(released, 2);
    }
}
