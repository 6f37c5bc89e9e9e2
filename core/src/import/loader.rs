//! glTF document walking.
//!
//! [`LoadContext`] holds the parsed document and its resolved buffers and
//! converts each part (geometry, materials, node tree, animations) into
//! [`MeshSource`](crate::mesh::MeshSource) pieces.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::animation::{AnimationClip, Keyframe, NodeChannel};
use crate::material::{MaterialDescription, TextureChannel, TextureSource};
use crate::math::{Mat4, Vec3, quat_from_array};
use crate::mesh::{
    AnimatedVertex, BoneRegistry, BoneWeights, MeshNode, NodeTransform, StaticVertex, Submesh,
    Triangle, VertexData, VertexWeight,
};

use super::buffers::decode_data_uri;
use super::error::ImportError;
use super::geometry;
use super::options::ImportOptions;

/// Vertex, index and skinning data of every imported primitive.
pub(super) struct Geometry {
    pub vertices: VertexData,
    pub triangles: Vec<Triangle>,
    pub submeshes: Vec<Submesh>,
    pub bones: BoneRegistry,
    /// Whether some primitive had no material and was given the fallback.
    pub uses_fallback_material: bool,
}

/// Joint names and inverse bind matrices of one skin.
struct SkinJoints {
    names: Vec<String>,
    offsets: Vec<Mat4>,
}

/// Attributes of one primitive after topology conversion and generation.
struct PrimitiveData {
    vertices: Vec<StaticVertex>,
    triangles: Vec<u32>,
    joints: Option<Vec<[u16; 4]>>,
    weights: Option<Vec<[f32; 4]>>,
}

pub(super) struct LoadContext<'a> {
    document: gltf_dep::Document,
    buffers: Vec<Vec<u8>>,
    base_dir: Option<&'a Path>,
    options: ImportOptions,
    /// Name of every node, generated for unnamed nodes.
    node_names: Vec<String>,
    /// glTF mesh index -> submesh indices (one per imported primitive).
    mesh_submeshes: Vec<Vec<u32>>,
    /// Per material index, which PBR factors the file writes out.
    stated_factors: Vec<StatedFactors>,
}

/// Metallic-roughness factors present in a material's JSON.
///
/// The parsed document reports an absent factor as 1.0, which cannot be told
/// apart from an explicit 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct StatedFactors {
    pub metallic: bool,
    pub roughness: bool,
}

impl StatedFactors {
    const ALL: Self = Self {
        metallic: true,
        roughness: true,
    };
}

/// Read which metallic/roughness factors each material states.
///
/// `data` is the whole `.gltf` or `.glb` file. Unparseable input yields an
/// empty list, in which case every factor is taken as stated.
pub(super) fn stated_factors(data: &[u8]) -> Vec<StatedFactors> {
    use gltf_dep::json::Value;

    let json = if data.starts_with(b"glTF") {
        match gltf_dep::Glb::from_slice(data) {
            Ok(glb) => glb.json.into_owned(),
            Err(_) => return Vec::new(),
        }
    } else {
        data.to_vec()
    };
    let Ok(root) = gltf_dep::json::deserialize::from_slice::<Value>(&json) else {
        return Vec::new();
    };
    let Some(materials) = root.get("materials").and_then(Value::as_array) else {
        return Vec::new();
    };

    materials
        .iter()
        .map(|material| {
            let pbr = material.get("pbrMetallicRoughness");
            let has = |key: &str| pbr.and_then(|pbr| pbr.get(key)).is_some();
            StatedFactors {
                metallic: has("metallicFactor"),
                roughness: has("roughnessFactor"),
            }
        })
        .collect()
}

impl<'a> LoadContext<'a> {
    pub fn new(
        document: gltf_dep::Document,
        buffers: Vec<Vec<u8>>,
        base_dir: Option<&'a Path>,
        options: ImportOptions,
        stated_factors: Vec<StatedFactors>,
    ) -> Self {
        let node_names = document
            .nodes()
            .map(|node| match node.name() {
                Some(name) => name.to_string(),
                None => format!("node_{}", node.index()),
            })
            .collect();
        Self {
            document,
            buffers,
            base_dir,
            options,
            node_names,
            mesh_submeshes: Vec::new(),
            stated_factors,
        }
    }

    /// A file with any animation is imported with the skinned layout.
    pub fn is_animated(&self) -> bool {
        self.document.animations().next().is_some()
    }

    fn buffer(&self, buffer: gltf_dep::Buffer<'_>) -> Option<&[u8]> {
        self.buffers.get(buffer.index()).map(Vec::as_slice)
    }

    /// Read every mesh primitive into one shared vertex and triangle array.
    ///
    /// # Panics
    ///
    /// Panics if a triangle primitive has no positions, has no normals while
    /// normal generation is disabled, or has an index count that is not a
    /// multiple of three.
    pub fn load_geometry(&mut self) -> Result<Geometry, ImportError> {
        let animated = self.is_animated();
        let skins = self.load_skins();
        let mesh_skins: HashMap<usize, usize> = self
            .document
            .nodes()
            .filter_map(|node| Some((node.mesh()?.index(), node.skin()?.index())))
            .collect();
        let fallback_material = self.document.materials().count() as u32;

        let mut static_vertices = Vec::new();
        let mut animated_vertices = Vec::new();
        let mut triangles: Vec<Triangle> = Vec::new();
        let mut submeshes = Vec::new();
        let mut bones = BoneRegistry::new();
        let mut uses_fallback_material = false;
        let mut mesh_submeshes = Vec::new();

        for mesh in self.document.meshes() {
            let mesh_name = match mesh.name() {
                Some(name) => name.to_string(),
                None => format!("mesh_{}", mesh.index()),
            };
            let mut indices_of_mesh = Vec::new();

            for (prim_index, primitive) in mesh.primitives().enumerate() {
                let Some(data) = self.load_primitive(&primitive, &mesh_name, prim_index)? else {
                    continue;
                };

                let material_index = match primitive.material().index() {
                    Some(index) => index as u32,
                    None => {
                        uses_fallback_material = true;
                        fallback_material
                    }
                };

                let base_vertex = (static_vertices.len() + animated_vertices.len()) as u32;
                let submesh = Submesh::new(
                    base_vertex,
                    (triangles.len() * 3) as u32,
                    data.vertices.len() as u32,
                    data.triangles.len() as u32,
                    material_index,
                )
                .with_mesh_name(if mesh.primitives().count() > 1 {
                    format!("{mesh_name}_{prim_index}")
                } else {
                    mesh_name.clone()
                });

                triangles.extend(
                    data.triangles
                        .chunks_exact(3)
                        .map(|t| [t[0], t[1], t[2]]),
                );

                if animated {
                    animated_vertices.extend(data.vertices.iter().map(AnimatedVertex::from_static));
                    let skin = mesh_skins.get(&mesh.index()).and_then(|&s| skins.get(s));
                    if let (Some(skin), Some(joints), Some(weights)) =
                        (skin, &data.joints, &data.weights)
                    {
                        let bone_weights = collect_bone_weights(skin, joints, weights)?;
                        bones.apply(&mut animated_vertices, &submesh, &bone_weights);
                    }
                } else {
                    static_vertices.extend_from_slice(&data.vertices);
                }

                indices_of_mesh.push(submeshes.len() as u32);
                submeshes.push(submesh);
            }
            mesh_submeshes.push(indices_of_mesh);
        }

        if self.options.normalize_bone_weights {
            animated_vertices
                .iter_mut()
                .for_each(AnimatedVertex::normalize_weights);
        }

        self.mesh_submeshes = mesh_submeshes;
        let vertices = if animated {
            VertexData::Animated(animated_vertices)
        } else {
            VertexData::Static(static_vertices)
        };

        Ok(Geometry {
            vertices,
            triangles,
            submeshes,
            bones,
            uses_fallback_material,
        })
    }

    /// Read one primitive. `None` for primitives without faces.
    fn load_primitive(
        &self,
        primitive: &gltf_dep::Primitive<'_>,
        mesh_name: &str,
        prim_index: usize,
    ) -> Result<Option<PrimitiveData>, ImportError> {
        let reader = primitive.reader(|b| self.buffer(b));

        let positions: Vec<[f32; 3]> = match reader.read_positions() {
            Some(iter) => iter.collect(),
            None => panic!("mesh '{mesh_name}' primitive {prim_index} has no positions"),
        };
        let vertex_count = positions.len();

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..vertex_count as u32).collect(),
        };
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(ImportError::Accessor(format!(
                "mesh '{mesh_name}' primitive {prim_index} index {bad} exceeds {vertex_count} vertices"
            )));
        }

        let Some(triangles) = geometry::triangulate(primitive.mode(), indices) else {
            log::warn!(
                "Skipping mesh '{mesh_name}' primitive {prim_index}: {:?} topology has no faces",
                primitive.mode()
            );
            return Ok(None);
        };
        assert!(
            triangles.len() % 3 == 0,
            "mesh '{mesh_name}' primitive {prim_index} has a face that is not a triangle ({} indices)",
            triangles.len()
        );

        // Counts are checked before generation reads the attributes by index.
        let count_mismatch = |attribute: &str, count: usize| {
            ImportError::Accessor(format!(
                "mesh '{mesh_name}' primitive {prim_index} has {count} {attribute} for {vertex_count} positions"
            ))
        };

        let normals: Vec<[f32; 3]> = match reader.read_normals() {
            Some(iter) => iter.collect(),
            None => {
                assert!(
                    self.options.generate_normals,
                    "mesh '{mesh_name}' primitive {prim_index} has no normals"
                );
                geometry::generate_normals(&positions, &triangles)
            }
        };
        if normals.len() != vertex_count {
            return Err(count_mismatch("normals", normals.len()));
        }

        let tex_coords: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
            Some(uvs) => uvs.into_f32().collect(),
            None => geometry::generate_planar_uvs(&positions),
        };
        if tex_coords.len() != vertex_count {
            return Err(count_mismatch("texture coordinates", tex_coords.len()));
        }

        let tangents: Vec<[f32; 4]> = match reader.read_tangents() {
            Some(iter) => iter.collect(),
            None if self.options.generate_tangents => {
                geometry::generate_tangents(&positions, &normals, &tex_coords, &triangles)
            }
            None => vec![[0.0; 4]; vertex_count],
        };
        if tangents.len() != vertex_count {
            return Err(count_mismatch("tangents", tangents.len()));
        }

        let vertices = (0..vertex_count)
            .map(|i| StaticVertex {
                position: positions[i],
                normal: normals[i],
                tangent: [tangents[i][0], tangents[i][1], tangents[i][2]],
                binormal: geometry::binormal(normals[i], tangents[i]),
                tex_coord: tex_coords[i],
            })
            .collect();

        let joints = reader
            .read_joints(0)
            .map(|j| j.into_u16().collect::<Vec<_>>());
        let weights = reader
            .read_weights(0)
            .map(|w| w.into_f32().collect::<Vec<_>>());

        Ok(Some(PrimitiveData {
            vertices,
            triangles,
            joints,
            weights,
        }))
    }

    fn load_skins(&self) -> Vec<SkinJoints> {
        self.document
            .skins()
            .map(|skin| {
                let names: Vec<String> = skin
                    .joints()
                    .map(|joint| self.node_names[joint.index()].clone())
                    .collect();
                let reader = skin.reader(|b| self.buffer(b));
                let mut offsets: Vec<Mat4> = reader
                    .read_inverse_bind_matrices()
                    .map(|iter| iter.map(Mat4::from).collect())
                    .unwrap_or_default();
                offsets.resize(names.len(), Mat4::identity());
                SkinJoints { names, offsets }
            })
            .collect()
    }

    /// Convert every material. A fallback material is appended when some
    /// primitive has none, or when the file declares no materials at all.
    pub fn load_materials(&self, uses_fallback_material: bool) -> Vec<MaterialDescription> {
        let mut materials: Vec<MaterialDescription> = self
            .document
            .materials()
            .map(|material| self.load_material(&material))
            .collect();
        if uses_fallback_material || materials.is_empty() {
            materials.push(MaterialDescription::fallback());
        }
        materials
    }

    fn load_material(&self, material: &gltf_dep::Material<'_>) -> MaterialDescription {
        let pbr = material.pbr_metallic_roughness();
        let [r, g, b, _] = pbr.base_color_factor();
        let [er, eg, eb] = material.emissive_factor();

        let stated = material
            .index()
            .and_then(|index| self.stated_factors.get(index).copied())
            .unwrap_or(StatedFactors::ALL);

        // Unstated factors keep the Phong defaults rather than glTF's 1.0.
        let mut desc = MaterialDescription::new()
            .with_albedo_color([r, g, b])
            .with_emission(er.max(eg).max(eb));
        if stated.metallic {
            desc = desc.with_metalness(pbr.metallic_factor());
        }
        if stated.roughness {
            desc = desc.with_roughness(pbr.roughness_factor());
        }
        if let Some(name) = material.name() {
            desc = desc.with_name(name);
        }

        if let Some(info) = pbr.base_color_texture() {
            desc = self.with_texture(desc, TextureChannel::Albedo, info.texture());
        }
        if let Some(info) = pbr.metallic_roughness_texture() {
            desc = self.with_texture(desc, TextureChannel::Roughness, info.texture());
            desc = self.with_texture(desc, TextureChannel::Metalness, info.texture());
        }
        if let Some(normal) = material.normal_texture() {
            desc = self.with_texture(desc, TextureChannel::Normal, normal.texture());
        }

        // Specular-glossiness materials carry Phong-style parameters: the
        // glossiness becomes a shininess and roughness is derived from it.
        if let Some(sg) = material.pbr_specular_glossiness() {
            let [r, g, b, _] = sg.diffuse_factor();
            desc = desc
                .with_albedo_color([r, g, b])
                .with_shininess(sg.glossiness_factor() * 100.0);
            desc.roughness = None;
            if let Some(info) = sg.diffuse_texture() {
                desc = self.with_texture(desc, TextureChannel::Albedo, info.texture());
            }
        }

        desc
    }

    fn with_texture(
        &self,
        desc: MaterialDescription,
        channel: TextureChannel,
        texture: gltf_dep::Texture<'_>,
    ) -> MaterialDescription {
        match self.texture_source(&texture) {
            Some(source) => desc.with_texture(channel, source),
            None => {
                log::warn!(
                    "Texture {} of {channel:?} channel could not be resolved",
                    texture.index()
                );
                desc
            }
        }
    }

    fn texture_source(&self, texture: &gltf_dep::Texture<'_>) -> Option<TextureSource> {
        let image = texture.source();
        let name = image.name().map(String::from);
        match image.source() {
            gltf_dep::image::Source::View { view, .. } => {
                let buffer = self.buffers.get(view.buffer().index())?;
                let data = buffer.get(view.offset()..view.offset() + view.length())?;
                Some(TextureSource::Embedded {
                    name,
                    data: data.to_vec(),
                })
            }
            gltf_dep::image::Source::Uri { uri, .. } => match decode_data_uri(uri) {
                Some(data) => Some(TextureSource::Embedded { name, data }),
                None => {
                    let path = match self.base_dir {
                        Some(dir) => dir.join(uri),
                        None => PathBuf::from(uri),
                    };
                    Some(TextureSource::File(path))
                }
            },
        }
    }

    /// Node tree of the selected scene.
    ///
    /// A scene with a single root node uses it as the tree root; otherwise
    /// the roots are gathered under a synthetic `root` node. Must run after
    /// [`load_geometry`](Self::load_geometry).
    pub fn load_root(&self) -> MeshNode {
        let scene = match self.options.scene {
            Some(index) => {
                let scene = self.document.scenes().nth(index);
                if scene.is_none() {
                    log::warn!("Scene {index} not found, using the default scene");
                }
                scene
            }
            None => None,
        }
        .or_else(|| self.document.default_scene())
        .or_else(|| self.document.scenes().next());

        let Some(scene) = scene else {
            let all = self.mesh_submeshes.iter().flatten().copied().collect();
            return MeshNode::new("root").with_submeshes(all);
        };

        let mut roots: Vec<MeshNode> = scene.nodes().map(|n| self.load_node(&n)).collect();
        if roots.len() == 1 {
            roots.remove(0)
        } else {
            MeshNode::new("root").with_children(roots)
        }
    }

    fn load_node(&self, node: &gltf_dep::Node<'_>) -> MeshNode {
        let (translation, rotation, scale) = node.transform().decomposed();
        let submeshes = node
            .mesh()
            .and_then(|m| self.mesh_submeshes.get(m.index()).cloned())
            .unwrap_or_default();

        MeshNode::new(self.node_names[node.index()].clone())
            .with_transform(
                NodeTransform::IDENTITY
                    .with_translation(translation)
                    .with_rotation(rotation)
                    .with_scale(scale),
            )
            .with_submeshes(submeshes)
            .with_children(node.children().map(|c| self.load_node(&c)).collect())
    }

    /// Convert every animation into a clip with one channel per target node.
    pub fn load_animations(&self) -> Result<Vec<AnimationClip>, ImportError> {
        use gltf_dep::animation::util::ReadOutputs;

        let mut clips = Vec::new();
        for animation in self.document.animations() {
            let mut channels: Vec<NodeChannel> = Vec::new();
            let mut by_node: HashMap<usize, usize> = HashMap::new();

            for (channel_index, channel) in animation.channels().enumerate() {
                let node = channel.target().node().index();
                let cubic = channel.sampler().interpolation()
                    == gltf_dep::animation::Interpolation::CubicSpline;
                let reader = channel.reader(|b| self.buffer(b));
                let times: Vec<f32> = reader
                    .read_inputs()
                    .ok_or_else(|| {
                        ImportError::Accessor(format!(
                            "animation {} channel {} has no input times",
                            animation.index(),
                            channel_index
                        ))
                    })?
                    .collect();

                let slot = *by_node.entry(node).or_insert_with(|| {
                    channels.push(NodeChannel::new(self.node_names[node].clone()));
                    channels.len() - 1
                });
                let target = &mut channels[slot];

                match reader.read_outputs() {
                    Some(ReadOutputs::Translations(values)) => {
                        target.positions =
                            keyframes(&times, key_values(values.collect(), cubic), Vec3::from);
                    }
                    Some(ReadOutputs::Rotations(values)) => {
                        target.rotations = keyframes(
                            &times,
                            key_values(values.into_f32().collect(), cubic),
                            quat_from_array,
                        );
                    }
                    Some(ReadOutputs::Scales(values)) => {
                        target.scales =
                            keyframes(&times, key_values(values.collect(), cubic), Vec3::from);
                    }
                    Some(ReadOutputs::MorphTargetWeights(_)) => {
                        log::trace!("Ignoring morph target weights of animation {}", animation.index());
                    }
                    None => {
                        return Err(ImportError::Accessor(format!(
                            "animation {} channel {} has no output values",
                            animation.index(),
                            channel_index
                        )));
                    }
                }
            }

            let name = match animation.name() {
                Some(name) => name.to_string(),
                None => format!("animation_{}", animation.index()),
            };
            clips.push(AnimationClip::new(name, channels));
        }
        Ok(clips)
    }
}

/// Cubic-spline samplers store (in-tangent, value, out-tangent) per key;
/// keep only the values.
fn key_values<T: Copy>(values: Vec<T>, cubic: bool) -> Vec<T> {
    if cubic {
        values.chunks_exact(3).map(|c| c[1]).collect()
    } else {
        values
    }
}

fn keyframes<T, U>(times: &[f32], values: Vec<T>, convert: impl Fn(T) -> U) -> Vec<Keyframe<U>> {
    times
        .iter()
        .zip(values)
        .map(|(&time, value)| Keyframe::new(time, convert(value)))
        .collect()
}

/// Invert per-vertex joint/weight attributes into per-bone weight lists.
fn collect_bone_weights(
    skin: &SkinJoints,
    joints: &[[u16; 4]],
    weights: &[[f32; 4]],
) -> Result<Vec<BoneWeights>, ImportError> {
    let mut bones: Vec<BoneWeights> = skin
        .names
        .iter()
        .zip(&skin.offsets)
        .map(|(name, offset)| BoneWeights::new(name.clone(), *offset))
        .collect();

    for (vertex_id, (joint_set, weight_set)) in joints.iter().zip(weights).enumerate() {
        for (&joint, &weight) in joint_set.iter().zip(weight_set) {
            if weight <= 0.0 {
                continue;
            }
            let bone = bones.get_mut(joint as usize).ok_or_else(|| {
                ImportError::Accessor(format!(
                    "vertex {vertex_id} references joint {joint} of a {}-joint skin",
                    skin.names.len()
                ))
            })?;
            bone.weights.push(VertexWeight {
                vertex_id: vertex_id as u32,
                weight,
            });
        }
    }
    Ok(bones)
}
