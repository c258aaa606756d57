//! glTF 2.0 decoder for `.gltf` (JSON + external buffers) and `.glb`
//! (binary container).
//!
//! The JSON document is deserialized with serde into a minimal model and
//! every numeric cross-reference (scene -> node -> mesh -> accessor ->
//! bufferView -> buffer, and material/texture/image chains) is resolved with
//! explicit bounds checks; any violation is `MalformedFile`. Valid files
//! using constructs outside this pipeline (skinning, sparse accessors,
//! non-triangle primitives, `data:` URIs) fail with `UnsupportedFeature`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use plinth_math::{Mat4, Quat, Vec3};
use serde::Deserialize;

use crate::builder::SourceScene;
use crate::error::{LoadError, LoadResult};
use crate::loader::CancelFlag;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::scene::{SceneNode, Transform};

const GLB_MAGIC: &[u8; 4] = b"glTF";
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const MODE_TRIANGLES: u32 = 4;

const COMPONENT_U8: u32 = 5121;
const COMPONENT_U16: u32 = 5123;
const COMPONENT_U32: u32 = 5125;
const COMPONENT_F32: u32 = 5126;

/// Decode a `.gltf` or `.glb` file from disk.
pub fn decode(path: &Path, cancel: &CancelFlag) -> LoadResult<SourceScene> {
    let bytes = std::fs::read(path)?;
    decode_slice(&bytes, path.parent(), cancel)
}

/// Decode glTF bytes; GLB is recognized by its magic, anything else is
/// treated as a JSON document. `base_dir` anchors external buffer URIs.
pub fn decode_slice(
    bytes: &[u8],
    base_dir: Option<&Path>,
    cancel: &CancelFlag,
) -> LoadResult<SourceScene> {
    let (json, bin) = if bytes.starts_with(GLB_MAGIC) {
        let (json, bin) = parse_glb(bytes)?;
        (json, bin)
    } else {
        (bytes, None)
    };

    let doc: Document = serde_json::from_slice(json)
        .map_err(|e| LoadError::malformed(format!("glTF JSON: {e}")))?;

    if !doc.asset.version.starts_with('2') {
        return Err(LoadError::Unsupported(format!(
            "glTF version {}",
            doc.asset.version
        )));
    }
    if !doc.skins.is_empty() {
        return Err(LoadError::Unsupported("skinned meshes".into()));
    }

    let buffers = load_buffers(&doc, bin, base_dir)?;
    let materials = convert_materials(&doc)?;

    let scene_index = doc.scene.unwrap_or(0);
    let scene = doc
        .scenes
        .get(scene_index)
        .ok_or_else(|| LoadError::malformed(format!("scene index {scene_index} out of range")))?;

    let ctx = DecodeContext {
        doc: &doc,
        buffers: &buffers,
        cancel,
    };

    let mut root = SceneNode::group(scene.name.clone().unwrap_or_default());
    let mut path = Vec::new();
    for &node_index in &scene.nodes {
        root.children.push(ctx.convert_node(node_index, &mut path)?);
    }

    // glTF is Y-up, meters; no conversion needed downstream
    Ok(SourceScene::canonical(root, materials))
}

// ============================================================================
// Document model
// ============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    asset: AssetInfo,
    scene: Option<usize>,
    #[serde(default)]
    scenes: Vec<SceneDef>,
    #[serde(default)]
    nodes: Vec<NodeDef>,
    #[serde(default)]
    meshes: Vec<MeshDef>,
    #[serde(default)]
    materials: Vec<MaterialDef>,
    #[serde(default)]
    accessors: Vec<AccessorDef>,
    #[serde(default)]
    buffer_views: Vec<BufferViewDef>,
    #[serde(default)]
    buffers: Vec<BufferDef>,
    #[serde(default)]
    textures: Vec<TextureDef>,
    #[serde(default)]
    images: Vec<ImageDef>,
    #[serde(default)]
    skins: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct AssetInfo {
    version: String,
}

#[derive(Deserialize)]
struct SceneDef {
    #[serde(default)]
    nodes: Vec<usize>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct NodeDef {
    name: Option<String>,
    #[serde(default)]
    children: Vec<usize>,
    mesh: Option<usize>,
    skin: Option<usize>,
    matrix: Option<[f32; 16]>,
    translation: Option<[f32; 3]>,
    rotation: Option<[f32; 4]>,
    scale: Option<[f32; 3]>,
}

#[derive(Deserialize)]
struct MeshDef {
    name: Option<String>,
    primitives: Vec<PrimitiveDef>,
}

#[derive(Deserialize)]
struct PrimitiveDef {
    attributes: HashMap<String, usize>,
    indices: Option<usize>,
    material: Option<usize>,
    #[serde(default = "default_mode")]
    mode: u32,
}

fn default_mode() -> u32 {
    MODE_TRIANGLES
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessorDef {
    buffer_view: Option<usize>,
    #[serde(default)]
    byte_offset: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: String,
    sparse: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferViewDef {
    buffer: usize,
    #[serde(default)]
    byte_offset: usize,
    byte_length: usize,
    byte_stride: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferDef {
    uri: Option<String>,
    byte_length: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MaterialDef {
    name: Option<String>,
    pbr_metallic_roughness: Option<PbrDef>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PbrDef {
    base_color_factor: Option<[f32; 4]>,
    metallic_factor: Option<f32>,
    roughness_factor: Option<f32>,
    base_color_texture: Option<TextureRef>,
}

#[derive(Deserialize)]
struct TextureRef {
    index: usize,
}

#[derive(Deserialize)]
struct TextureDef {
    source: Option<usize>,
}

#[derive(Deserialize)]
struct ImageDef {
    uri: Option<String>,
}

// ============================================================================
// Container & buffers
// ============================================================================

/// Split a GLB container into its JSON chunk and optional BIN chunk.
fn parse_glb(bytes: &[u8]) -> LoadResult<(&[u8], Option<&[u8]>)> {
    if bytes.len() < 12 {
        return Err(LoadError::malformed("GLB shorter than its header"));
    }
    let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    if version != 2 {
        return Err(LoadError::Unsupported(format!("GLB version {version}")));
    }
    let total = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
    if total > bytes.len() {
        return Err(LoadError::malformed("GLB length field exceeds file size"));
    }

    let mut json = None;
    let mut bin = None;
    let mut offset = 12;
    while offset + 8 <= total {
        let length = u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap()) as usize;
        let kind = u32::from_le_bytes(bytes[offset + 4..offset + 8].try_into().unwrap());
        let start = offset + 8;
        let end = start
            .checked_add(length)
            .filter(|&e| e <= total)
            .ok_or_else(|| LoadError::malformed("GLB chunk overruns container"))?;

        match kind {
            CHUNK_JSON if json.is_none() => json = Some(&bytes[start..end]),
            CHUNK_BIN if bin.is_none() => bin = Some(&bytes[start..end]),
            _ => {} // unknown chunks are skipped per spec
        }
        // Chunks are 4-byte aligned
        offset = end + ((4 - end % 4) % 4);
    }

    let json = json.ok_or_else(|| LoadError::malformed("GLB without a JSON chunk"))?;
    Ok((json, bin))
}

/// Materialize every buffer: the GLB BIN chunk or external files.
fn load_buffers(
    doc: &Document,
    bin: Option<&[u8]>,
    base_dir: Option<&Path>,
) -> LoadResult<Vec<Vec<u8>>> {
    let mut buffers = Vec::with_capacity(doc.buffers.len());
    for (i, buffer) in doc.buffers.iter().enumerate() {
        let data = match &buffer.uri {
            None => {
                // Only the first buffer may refer to the GLB BIN chunk
                let bin = bin.filter(|_| i == 0).ok_or_else(|| {
                    LoadError::malformed(format!("buffer {i} has no uri and no BIN chunk"))
                })?;
                bin.to_vec()
            }
            Some(uri) if uri.starts_with("data:") => {
                return Err(LoadError::Unsupported("data: URI buffers".into()));
            }
            Some(uri) => {
                let dir = base_dir.ok_or_else(|| {
                    LoadError::malformed(format!("external buffer '{uri}' without a base directory"))
                })?;
                std::fs::read(dir.join(uri))?
            }
        };
        if data.len() < buffer.byte_length {
            return Err(LoadError::malformed(format!(
                "buffer {i} is {} bytes, declared {}",
                data.len(),
                buffer.byte_length
            )));
        }
        buffers.push(data);
    }
    Ok(buffers)
}

// ============================================================================
// Conversion
// ============================================================================

fn convert_materials(doc: &Document) -> LoadResult<Vec<Arc<Material>>> {
    let mut materials = Vec::with_capacity(doc.materials.len());
    for def in &doc.materials {
        let mut material = Material {
            name: def.name.clone().unwrap_or_default(),
            // glTF defaults: white, fully metallic, fully rough
            base_color: Vec3::ONE,
            metallic: 1.0,
            roughness: 1.0,
            base_color_texture: None,
        };

        if let Some(pbr) = &def.pbr_metallic_roughness {
            if let Some([r, g, b, _a]) = pbr.base_color_factor {
                material.base_color = Vec3::new(r, g, b);
            }
            material.metallic = pbr.metallic_factor.unwrap_or(1.0);
            material.roughness = pbr.roughness_factor.unwrap_or(1.0);

            if let Some(tex_ref) = &pbr.base_color_texture {
                let texture = doc.textures.get(tex_ref.index).ok_or_else(|| {
                    LoadError::malformed(format!("texture index {} out of range", tex_ref.index))
                })?;
                if let Some(source) = texture.source {
                    let image = doc.images.get(source).ok_or_else(|| {
                        LoadError::malformed(format!("image index {source} out of range"))
                    })?;
                    material.base_color_texture = image.uri.clone();
                }
            }
        }
        materials.push(Arc::new(material));
    }
    Ok(materials)
}

struct DecodeContext<'a> {
    doc: &'a Document,
    buffers: &'a [Vec<u8>],
    cancel: &'a CancelFlag,
}

impl DecodeContext<'_> {
    /// Convert a node and its subtree. `path` is the recursion stack used to
    /// reject cyclic node graphs.
    fn convert_node(&self, index: usize, path: &mut Vec<usize>) -> LoadResult<SceneNode> {
        let def = self
            .doc
            .nodes
            .get(index)
            .ok_or_else(|| LoadError::malformed(format!("node index {index} out of range")))?;
        if path.contains(&index) {
            return Err(LoadError::malformed(format!(
                "cycle in node graph at node {index}"
            )));
        }
        if def.skin.is_some() {
            return Err(LoadError::Unsupported("skinned meshes".into()));
        }

        let mut node = SceneNode::group(def.name.clone().unwrap_or_default());
        node.transform = node_transform(def);

        if let Some(mesh_index) = def.mesh {
            self.cancel.check()?;
            let mesh_def = self.doc.meshes.get(mesh_index).ok_or_else(|| {
                LoadError::malformed(format!("mesh index {mesh_index} out of range"))
            })?;
            let mesh_name = mesh_def.name.clone().unwrap_or_default();

            if let [primitive] = mesh_def.primitives.as_slice() {
                node.mesh = Some(Arc::new(self.convert_primitive(primitive)?));
            } else {
                // Multiple primitives become one child node each
                for (i, primitive) in mesh_def.primitives.iter().enumerate() {
                    let mesh = Arc::new(self.convert_primitive(primitive)?);
                    node.children
                        .push(SceneNode::with_mesh(format!("{mesh_name}#{i}"), mesh));
                }
            }
        }

        path.push(index);
        for &child in &def.children {
            node.children.push(self.convert_node(child, path)?);
        }
        path.pop();

        Ok(node)
    }

    fn convert_primitive(&self, primitive: &PrimitiveDef) -> LoadResult<Mesh> {
        if primitive.mode != MODE_TRIANGLES {
            return Err(LoadError::Unsupported(format!(
                "primitive mode {}",
                primitive.mode
            )));
        }

        if let Some(material) = primitive.material {
            if material >= self.doc.materials.len() {
                return Err(LoadError::malformed(format!(
                    "material index {} out of range ({} materials)",
                    material,
                    self.doc.materials.len()
                )));
            }
        }

        let position_accessor = *primitive.attributes.get("POSITION").ok_or_else(|| {
            LoadError::malformed("primitive without POSITION attribute")
        })?;
        let positions = self.read_vec3(position_accessor)?;

        let normals = primitive
            .attributes
            .get("NORMAL")
            .map(|&a| self.read_vec3(a))
            .transpose()?;
        let uvs = primitive
            .attributes
            .get("TEXCOORD_0")
            .map(|&a| self.read_vec2(a))
            .transpose()?;

        let indices = match primitive.indices {
            Some(accessor) => self.read_indices(accessor)?,
            None => (0..positions.len() as u32).collect(),
        };
        if indices.len() % 3 != 0 {
            return Err(LoadError::malformed("index count is not a multiple of 3"));
        }
        if let Some(&max) = indices.iter().max() {
            if max as usize >= positions.len() {
                return Err(LoadError::malformed(format!(
                    "index {} out of range ({} vertices)",
                    max,
                    positions.len()
                )));
            }
        }

        let mut mesh = Mesh::new(positions, indices, normals);
        if let Some(uvs) = uvs {
            mesh = mesh.with_uvs(uvs);
        }
        if let Some(material) = primitive.material {
            mesh = mesh.with_material(material);
        }
        mesh.ensure_normals();
        Ok(mesh)
    }

    /// Resolve an accessor down to its bytes plus element stride.
    fn accessor_data(
        &self,
        index: usize,
        kind: &str,
        component_types: &[u32],
        element_size: usize,
    ) -> LoadResult<(&AccessorDef, &[u8], usize)> {
        let accessor = self
            .doc
            .accessors
            .get(index)
            .ok_or_else(|| LoadError::malformed(format!("accessor index {index} out of range")))?;

        if accessor.sparse.is_some() {
            return Err(LoadError::Unsupported("sparse accessors".into()));
        }
        if accessor.kind != kind {
            return Err(LoadError::malformed(format!(
                "accessor {index} is {}, expected {kind}",
                accessor.kind
            )));
        }
        if !component_types.contains(&accessor.component_type) {
            return Err(LoadError::malformed(format!(
                "accessor {index} has component type {}",
                accessor.component_type
            )));
        }

        let view_index = accessor
            .buffer_view
            .ok_or_else(|| LoadError::Unsupported("accessor without bufferView".into()))?;
        let view = self.doc.buffer_views.get(view_index).ok_or_else(|| {
            LoadError::malformed(format!("bufferView index {view_index} out of range"))
        })?;
        let buffer = self.buffers.get(view.buffer).ok_or_else(|| {
            LoadError::malformed(format!("buffer index {} out of range", view.buffer))
        })?;

        let view_end = view
            .byte_offset
            .checked_add(view.byte_length)
            .filter(|&e| e <= buffer.len())
            .ok_or_else(|| LoadError::malformed("bufferView overruns buffer"))?;
        let view_bytes = &buffer[view.byte_offset..view_end];

        let stride = view.byte_stride.unwrap_or(element_size);
        if stride < element_size {
            return Err(LoadError::malformed("byteStride smaller than element"));
        }
        if accessor.byte_offset > view_bytes.len() {
            return Err(LoadError::malformed(format!(
                "accessor {index} offset overruns its bufferView"
            )));
        }
        let needed = stride
            .checked_mul(accessor.count.saturating_sub(1))
            .and_then(|o| o.checked_add(accessor.byte_offset))
            .and_then(|o| o.checked_add(element_size))
            .ok_or_else(|| LoadError::malformed("accessor range overflows"))?;
        if accessor.count > 0 && needed > view_bytes.len() {
            return Err(LoadError::malformed(format!(
                "accessor {index} overruns its bufferView"
            )));
        }

        Ok((accessor, &view_bytes[accessor.byte_offset..], stride))
    }

    fn read_vec3(&self, index: usize) -> LoadResult<Vec<Vec3>> {
        let (accessor, bytes, stride) =
            self.accessor_data(index, "VEC3", &[COMPONENT_F32], 12)?;
        let mut out = Vec::with_capacity(accessor.count);
        for i in 0..accessor.count {
            let at = i * stride;
            out.push(Vec3::new(
                read_f32(bytes, at),
                read_f32(bytes, at + 4),
                read_f32(bytes, at + 8),
            ));
        }
        Ok(out)
    }

    fn read_vec2(&self, index: usize) -> LoadResult<Vec<[f32; 2]>> {
        let (accessor, bytes, stride) =
            self.accessor_data(index, "VEC2", &[COMPONENT_F32], 8)?;
        let mut out = Vec::with_capacity(accessor.count);
        for i in 0..accessor.count {
            let at = i * stride;
            out.push([read_f32(bytes, at), read_f32(bytes, at + 4)]);
        }
        Ok(out)
    }

    fn read_indices(&self, index: usize) -> LoadResult<Vec<u32>> {
        let accessor = self
            .doc
            .accessors
            .get(index)
            .ok_or_else(|| LoadError::malformed(format!("accessor index {index} out of range")))?;
        let element_size = match accessor.component_type {
            COMPONENT_U8 => 1,
            COMPONENT_U16 => 2,
            COMPONENT_U32 => 4,
            other => {
                return Err(LoadError::malformed(format!(
                    "index component type {other}"
                )))
            }
        };

        let (accessor, bytes, stride) = self.accessor_data(
            index,
            "SCALAR",
            &[COMPONENT_U8, COMPONENT_U16, COMPONENT_U32],
            element_size,
        )?;
        let mut out = Vec::with_capacity(accessor.count);
        for i in 0..accessor.count {
            let at = i * stride;
            let value = match element_size {
                1 => bytes[at] as u32,
                2 => u16::from_le_bytes(bytes[at..at + 2].try_into().unwrap()) as u32,
                _ => u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap()),
            };
            out.push(value);
        }
        Ok(out)
    }
}

fn node_transform(def: &NodeDef) -> Transform {
    if let Some(m) = def.matrix {
        return Transform::from_matrix(Mat4::from_cols_array(&m));
    }
    Transform {
        translation: def.translation.map(Vec3::from).unwrap_or(Vec3::ZERO),
        rotation: def
            .rotation
            .map(|[x, y, z, w]| Quat::from_xyzw(x, y, z, w))
            .unwrap_or(Quat::IDENTITY),
        scale: def.scale.map(Vec3::from).unwrap_or(Vec3::ONE),
    }
}

fn read_f32(bytes: &[u8], at: usize) -> f32 {
    f32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble a two-chunk GLB container around a JSON document and buffer.
    fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
        let mut json = json.as_bytes().to_vec();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut bin = bin.to_vec();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(GLB_MAGIC);
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        out.extend_from_slice(&json);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(&bin);
        out
    }

    /// Triangle buffer: 3 VEC3 f32 positions then 3 u16 indices.
    fn triangle_bin() -> Vec<u8> {
        let mut bin = Vec::new();
        for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in v {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }
        for i in [0u16, 1, 2] {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        bin
    }

    fn triangle_json(material: Option<usize>, materials: &str) -> String {
        let material = material
            .map(|m| format!(",\"material\":{m}"))
            .unwrap_or_default();
        format!(
            r#"{{
  "asset": {{"version": "2.0"}},
  "scene": 0,
  "scenes": [{{"nodes": [0], "name": "scene"}}],
  "nodes": [{{"mesh": 0, "name": "tri"}}],
  "meshes": [{{"primitives": [{{"attributes": {{"POSITION": 0}}, "indices": 1{material}}}]}}],
  {materials}
  "accessors": [
    {{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"}},
    {{"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}}
  ],
  "bufferViews": [
    {{"buffer": 0, "byteOffset": 0, "byteLength": 36}},
    {{"buffer": 0, "byteOffset": 36, "byteLength": 6}}
  ],
  "buffers": [{{"byteLength": 42}}]
}}"#
        )
    }

    fn decode_bytes(bytes: &[u8]) -> LoadResult<SourceScene> {
        decode_slice(bytes, None, &CancelFlag::new())
    }

    #[test]
    fn test_decode_glb_triangle() {
        let bytes = glb(&triangle_json(None, ""), &triangle_bin());
        let scene = decode_bytes(&bytes).unwrap();

        assert_eq!(scene.root.children.len(), 1);
        let node = &scene.root.children[0];
        assert_eq!(node.name, "tri");
        let mesh = node.mesh.as_ref().unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.has_normals()); // flat fallback
    }

    #[test]
    fn test_material_index_out_of_range_is_malformed() {
        let json = triangle_json(
            Some(7),
            r#""materials": [{"name": "only-one"}],"#,
        );
        let bytes = glb(&json, &triangle_bin());
        let err = decode_bytes(&bytes).unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)), "got {err:?}");
    }

    #[test]
    fn test_valid_material_is_converted() {
        let json = triangle_json(
            Some(0),
            r#""materials": [{"name": "red", "pbrMetallicRoughness": {"baseColorFactor": [1, 0, 0, 1], "metallicFactor": 0.2}}],"#,
        );
        let bytes = glb(&json, &triangle_bin());
        let scene = decode_bytes(&bytes).unwrap();

        assert_eq!(scene.materials.len(), 1);
        assert_eq!(scene.materials[0].name, "red");
        assert_eq!(scene.materials[0].base_color, Vec3::new(1.0, 0.0, 0.0));
        assert!((scene.materials[0].metallic - 0.2).abs() < 1e-6);
        assert_eq!(
            scene.root.children[0].mesh.as_ref().unwrap().material,
            Some(0)
        );
    }

    #[test]
    fn test_vertex_index_out_of_range_is_malformed() {
        let mut bin = triangle_bin();
        // Corrupt the last index to point past the vertex array
        let at = bin.len() - 2;
        bin[at..].copy_from_slice(&9u16.to_le_bytes());

        let bytes = glb(&triangle_json(None, ""), &bin);
        assert!(matches!(decode_bytes(&bytes), Err(LoadError::Malformed(_))));
    }

    #[test]
    fn test_truncated_glb_is_malformed() {
        let bytes = glb(&triangle_json(None, ""), &triangle_bin());
        assert!(matches!(
            decode_bytes(&bytes[..10]),
            Err(LoadError::Malformed(_))
        ));
    }

    #[test]
    fn test_node_cycle_is_malformed() {
        let json = r#"{
  "asset": {"version": "2.0"},
  "scenes": [{"nodes": [0]}],
  "nodes": [{"children": [1]}, {"children": [0]}]
}"#;
        let err = decode_bytes(json.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)), "got {err:?}");
    }

    #[test]
    fn test_node_transforms_applied() {
        let json = r#"{
  "asset": {"version": "2.0"},
  "scenes": [{"nodes": [0]}],
  "nodes": [{"translation": [1, 2, 3], "scale": [2, 2, 2]}]
}"#;
        let scene = decode_bytes(json.as_bytes()).unwrap();
        let node = &scene.root.children[0];
        assert_eq!(node.transform.translation, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(node.transform.scale, Vec3::splat(2.0));
    }

    #[test]
    fn test_data_uri_buffer_is_unsupported() {
        let json = r#"{
  "asset": {"version": "2.0"},
  "scenes": [{"nodes": []}],
  "buffers": [{"uri": "data:application/octet-stream;base64,AAAA", "byteLength": 3}]
}"#;
        let err = decode_bytes(json.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Unsupported(_)), "got {err:?}");
    }

    #[test]
    fn test_skinned_mesh_is_unsupported() {
        let json = r#"{
  "asset": {"version": "2.0"},
  "scenes": [{"nodes": []}],
  "skins": [{"joints": [0]}]
}"#;
        let err = decode_bytes(json.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Unsupported(_)));
    }

    #[test]
    fn test_non_triangle_mode_is_unsupported() {
        let json = r#"{
  "asset": {"version": "2.0"},
  "scenes": [{"nodes": [0]}],
  "nodes": [{"mesh": 0}],
  "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "mode": 1}]}],
  "accessors": [{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"}],
  "bufferViews": [{"buffer": 0, "byteLength": 36}],
  "buffers": [{"byteLength": 36}]
}"#;
        let bytes = glb(json, &[0u8; 36]);
        let err = decode_bytes(&bytes).unwrap_err();
        assert!(matches!(err, LoadError::Unsupported(_)), "got {err:?}");
    }

    #[test]
    fn test_decode_is_deterministic() {
        let bytes = glb(&triangle_json(None, ""), &triangle_bin());
        let a = decode_bytes(&bytes).unwrap();
        let b = decode_bytes(&bytes).unwrap();

        assert_eq!(a.root.node_count(), b.root.node_count());
        let ma = a.root.children[0].mesh.as_ref().unwrap();
        let mb = b.root.children[0].mesh.as_ref().unwrap();
        assert_eq!(ma.positions, mb.positions);
        assert_eq!(ma.indices, mb.indices);
    }
}
