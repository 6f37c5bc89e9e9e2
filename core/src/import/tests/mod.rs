//! In-memory glTF fixtures for importer tests.
//!
//! [`Fixture`] packs attribute data into one base64 `data:` buffer and
//! assembles the JSON document around it.

mod skinning_test;

const COMPONENT_F32: u32 = 5126;
const COMPONENT_U16: u32 = 5123;
const COMPONENT_U32: u32 = 5125;

pub(super) fn base64_encode(bytes: &[u8]) -> String {
    const TABLE: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(3) {
        let b = [
            chunk[0],
            chunk.get(1).copied().unwrap_or(0),
            chunk.get(2).copied().unwrap_or(0),
        ];
        let bits = (u32::from(b[0]) << 16) | (u32::from(b[1]) << 8) | u32::from(b[2]);
        for i in 0..4 {
            if i <= chunk.len() {
                out.push(TABLE[((bits >> (18 - 6 * i)) & 63) as usize] as char);
            } else {
                out.push('=');
            }
        }
    }
    out
}

/// Builder for a single-buffer glTF document.
#[derive(Default)]
pub(super) struct Fixture {
    bin: Vec<u8>,
    views: Vec<String>,
    accessors: Vec<String>,
    pub meshes: Vec<String>,
    pub nodes: Vec<String>,
    pub materials: Vec<String>,
    pub images: Vec<String>,
    pub textures: Vec<String>,
    pub skins: Vec<String>,
    pub animations: Vec<String>,
    pub scene_roots: Vec<usize>,
}

impl Fixture {
    fn push_accessor(
        &mut self,
        bytes: &[u8],
        component: u32,
        kind: &str,
        count: usize,
        bounds: Option<(Vec<f32>, Vec<f32>)>,
    ) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let view = self.views.len();
        self.views.push(format!(
            r#"{{"buffer":0,"byteOffset":{},"byteLength":{}}}"#,
            self.bin.len(),
            bytes.len()
        ));
        self.bin.extend_from_slice(bytes);

        let bounds = match bounds {
            Some((min, max)) => format!(r#","min":{min:?},"max":{max:?}"#),
            None => String::new(),
        };
        self.accessors.push(format!(
            r#"{{"bufferView":{view},"componentType":{component},"count":{count},"type":"{kind}"{bounds}}}"#
        ));
        self.accessors.len() - 1
    }

    pub fn vec3(&mut self, data: &[[f32; 3]]) -> usize {
        let mut min = vec![f32::MAX; 3];
        let mut max = vec![f32::MIN; 3];
        for v in data {
            for i in 0..3 {
                min[i] = min[i].min(v[i]);
                max[i] = max[i].max(v[i]);
            }
        }
        let bytes: Vec<u8> = data.iter().flatten().flat_map(|f| f.to_le_bytes()).collect();
        self.push_accessor(&bytes, COMPONENT_F32, "VEC3", data.len(), Some((min, max)))
    }

    pub fn vec2(&mut self, data: &[[f32; 2]]) -> usize {
        let bytes: Vec<u8> = data.iter().flatten().flat_map(|f| f.to_le_bytes()).collect();
        self.push_accessor(&bytes, COMPONENT_F32, "VEC2", data.len(), None)
    }

    pub fn vec4(&mut self, data: &[[f32; 4]]) -> usize {
        let bytes: Vec<u8> = data.iter().flatten().flat_map(|f| f.to_le_bytes()).collect();
        self.push_accessor(&bytes, COMPONENT_F32, "VEC4", data.len(), None)
    }

    pub fn scalars(&mut self, data: &[f32]) -> usize {
        let min = data.iter().copied().fold(f32::MAX, f32::min);
        let max = data.iter().copied().fold(f32::MIN, f32::max);
        let bytes: Vec<u8> = data.iter().flat_map(|f| f.to_le_bytes()).collect();
        self.push_accessor(&bytes, COMPONENT_F32, "SCALAR", data.len(), Some((vec![min], vec![max])))
    }

    pub fn indices(&mut self, data: &[u32]) -> usize {
        let bytes: Vec<u8> = data.iter().flat_map(|i| i.to_le_bytes()).collect();
        self.push_accessor(&bytes, COMPONENT_U32, "SCALAR", data.len(), None)
    }

    pub fn joints(&mut self, data: &[[u16; 4]]) -> usize {
        let bytes: Vec<u8> = data.iter().flatten().flat_map(|i| i.to_le_bytes()).collect();
        self.push_accessor(&bytes, COMPONENT_U16, "VEC4", data.len(), None)
    }

    pub fn matrices(&mut self, data: &[[f32; 16]]) -> usize {
        let bytes: Vec<u8> = data.iter().flatten().flat_map(|f| f.to_le_bytes()).collect();
        self.push_accessor(&bytes, COMPONENT_F32, "MAT4", data.len(), None)
    }

    /// Add a mesh with one primitive. `attributes` is the JSON body of the
    /// `attributes` object, e.g. `"POSITION":0,"NORMAL":1`.
    pub fn mesh(
        &mut self,
        name: &str,
        attributes: &str,
        indices: Option<usize>,
        material: Option<usize>,
        mode: u32,
    ) -> usize {
        let mut primitive = format!(r#"{{"attributes":{{{attributes}}},"mode":{mode}"#);
        if let Some(i) = indices {
            primitive.push_str(&format!(r#","indices":{i}"#));
        }
        if let Some(m) = material {
            primitive.push_str(&format!(r#","material":{m}"#));
        }
        primitive.push('}');
        self.meshes
            .push(format!(r#"{{"name":"{name}","primitives":[{primitive}]}}"#));
        self.meshes.len() - 1
    }

    /// Add a node. `extra` is appended verbatim inside the node object.
    pub fn node(&mut self, name: &str, extra: &str) -> usize {
        let sep = if extra.is_empty() { "" } else { "," };
        self.nodes
            .push(format!(r#"{{"name":"{name}"{sep}{extra}}}"#));
        self.nodes.len() - 1
    }

    pub fn to_json(&self) -> String {
        let join = |items: &[String]| items.join(",");
        let mut json = format!(
            r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":{:?}}}],"buffers":[{{"byteLength":{},"uri":"data:application/octet-stream;base64,{}"}}],"bufferViews":[{}],"accessors":[{}]"#,
            self.scene_roots,
            self.bin.len(),
            base64_encode(&self.bin),
            join(&self.views),
            join(&self.accessors),
        );
        for (key, items) in [
            ("meshes", &self.meshes),
            ("nodes", &self.nodes),
            ("materials", &self.materials),
            ("images", &self.images),
            ("textures", &self.textures),
            ("skins", &self.skins),
            ("animations", &self.animations),
        ] {
            if !items.is_empty() {
                json.push_str(&format!(r#","{key}":[{}]"#, join(items)));
            }
        }
        json.push('}');
        json
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_json().into_bytes()
    }
}

/// Positions, normals and UVs of a unit right triangle in the XY plane.
pub(super) fn triangle_attributes(fixture: &mut Fixture) -> String {
    let positions = fixture.vec3(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    let normals = fixture.vec3(&[[0.0, 0.0, 1.0]; 3]);
    let uvs = fixture.vec2(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
    format!(r#""POSITION":{positions},"NORMAL":{normals},"TEXCOORD_0":{uvs}"#)
}

#[test]
fn test_base64_encode() {
    assert_eq!(base64_encode(b"Hello World"), "SGVsbG8gV29ybGQ=");
    assert_eq!(base64_encode(b"a"), "YQ==");
    assert_eq!(base64_encode(b"abc"), "YWJj");
}
