//! USD layer decoding: `.usda` / `.usd` files and `.usdz` archives.
//!
//! A USDZ package is an uncompressed zip archive whose first USD layer entry
//! is the scene root. The layer (and any layers it references) is parsed with
//! the USDA parser and converted into a [`SourceScene`]; reference arcs are
//! resolved through an [`AssetResolver`] so in-archive and on-disk layers go
//! through the same path.
//!
//! Binary crate payloads (`.usdc`) are detected and reported as unsupported.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use plinth_math::Vec3;

use super::parser;
use super::types::{UsdMesh, UsdPrim, UsdReference, UsdXform};
use crate::builder::SourceScene;
use crate::error::{LoadError, LoadResult};
use crate::loader::CancelFlag;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::scene::{SceneNode, Transform};

/// Magic cookie of binary USD crate files.
const USDC_MAGIC: &[u8] = b"PXR-USDC";

/// Decode a standalone `.usda` / `.usd` layer from disk.
///
/// References are resolved relative to the layer's directory.
pub fn decode_usda(path: &Path, cancel: &CancelFlag) -> LoadResult<SourceScene> {
    let bytes = std::fs::read(path)?;
    let content = layer_text(&path.to_string_lossy(), &bytes)?;
    let resolver = DirResolver {
        base: path.parent().map(Path::to_path_buf),
    };
    decode_layer(&content, &resolver, cancel)
}

/// Decode a `.usdz` archive from disk.
pub fn decode_usdz(path: &Path, cancel: &CancelFlag) -> LoadResult<SourceScene> {
    let bytes = std::fs::read(path)?;
    decode_usdz_bytes(&bytes, cancel)
}

/// Decode a USDZ archive held in memory.
fn decode_usdz_bytes(bytes: &[u8], cancel: &CancelFlag) -> LoadResult<SourceScene> {
    cancel.check()?;

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(zip_error)?;

    let mut entries: HashMap<String, Vec<u8>> = HashMap::new();
    let mut names = Vec::new();
    for i in 0..archive.len() {
        cancel.check()?;
        let mut file = archive.by_index(i).map_err(zip_error)?;
        if file.is_dir() {
            continue;
        }
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        names.push(file.name().to_string());
        entries.insert(file.name().to_string(), data);
    }

    // The scene descriptor is the first USD layer in archive order
    let root_name = names
        .iter()
        .find(|name| is_layer_name(name))
        .cloned()
        .ok_or_else(|| LoadError::malformed("USDZ archive has no USD layer entry"))?;

    log::debug!(
        "USDZ root layer {:?} ({} archive entries)",
        root_name,
        names.len()
    );

    let content = layer_text(&root_name, &entries[&root_name])?;
    let resolver = ArchiveResolver { entries };
    decode_layer(&content, &resolver, cancel)
}

/// Parse a layer and convert it into a source scene.
fn decode_layer(
    content: &str,
    resolver: &dyn AssetResolver,
    cancel: &CancelFlag,
) -> LoadResult<SourceScene> {
    cancel.check()?;

    let stage = parser::parse_usda(content)?;
    let mut converter = StageConverter::new(resolver, cancel);

    let mut root = SceneNode::group("");
    for prim in &stage.prims {
        if let Some(node) = converter.convert_prim(prim)? {
            root.children.push(node);
        }
    }

    if root.mesh_count() == 0 {
        return Err(LoadError::malformed("no geometry in USD layer"));
    }

    Ok(SourceScene {
        root,
        materials: converter.materials,
        up_axis: stage.meta.up_axis,
        meters_per_unit: stage.meta.meters_per_unit,
    })
}

fn is_layer_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".usda") || lower.ends_with(".usd") || lower.ends_with(".usdc")
}

/// Interpret layer bytes as USDA text, rejecting binary crate payloads.
fn layer_text(name: &str, bytes: &[u8]) -> LoadResult<String> {
    if name.to_ascii_lowercase().ends_with(".usdc") || bytes.starts_with(USDC_MAGIC) {
        return Err(LoadError::Unsupported(format!(
            "binary USD (usdc) layer {name:?}"
        )));
    }
    String::from_utf8(bytes.to_vec())
        .map_err(|_| LoadError::malformed(format!("layer {name:?} is not valid UTF-8")))
}

fn zip_error(err: zip::result::ZipError) -> LoadError {
    match err {
        zip::result::ZipError::Io(e) => LoadError::Io(e),
        other => LoadError::malformed(format!("invalid USDZ archive: {other}")),
    }
}

/// Source of referenced layers: filesystem for loose files, archive entries
/// for USDZ packages.
trait AssetResolver {
    fn read_layer(&self, asset_path: &str) -> LoadResult<String>;
}

struct DirResolver {
    base: Option<PathBuf>,
}

impl AssetResolver for DirResolver {
    fn read_layer(&self, asset_path: &str) -> LoadResult<String> {
        let full = match &self.base {
            Some(base) => base.join(asset_path),
            None => PathBuf::from(asset_path),
        };
        let bytes = std::fs::read(&full)?;
        layer_text(asset_path, &bytes)
    }
}

struct ArchiveResolver {
    entries: HashMap<String, Vec<u8>>,
}

impl AssetResolver for ArchiveResolver {
    fn read_layer(&self, asset_path: &str) -> LoadResult<String> {
        let key = asset_path.trim_start_matches("./");
        let bytes = self.entries.get(key).ok_or_else(|| {
            LoadError::malformed(format!("referenced layer {asset_path:?} missing from archive"))
        })?;
        layer_text(asset_path, bytes)
    }
}

/// Converts parsed USD prims into scene graph nodes, resolving references
/// along the way.
struct StageConverter<'a> {
    resolver: &'a dyn AssetResolver,
    cancel: &'a CancelFlag,
    materials: Vec<Arc<Material>>,
    /// Parsed referenced layers, keyed by asset path
    layer_cache: HashMap<String, Vec<UsdPrim>>,
    /// Asset paths currently being resolved, for cycle detection
    resolving: Vec<String>,
}

impl<'a> StageConverter<'a> {
    fn new(resolver: &'a dyn AssetResolver, cancel: &'a CancelFlag) -> Self {
        Self {
            resolver,
            cancel,
            materials: Vec::new(),
            layer_cache: HashMap::new(),
            resolving: Vec::new(),
        }
    }

    fn convert_prim(&mut self, prim: &UsdPrim) -> LoadResult<Option<SceneNode>> {
        match prim {
            UsdPrim::Xform(xform) => self.convert_xform(xform).map(Some),
            UsdPrim::Mesh(mesh) => self.convert_mesh(mesh).map(Some),
            UsdPrim::Reference(reference) => self.convert_reference(reference).map(Some),
            UsdPrim::Unknown(prim_type) => {
                log::debug!("skipping {prim_type} prim");
                Ok(None)
            }
        }
    }

    fn convert_xform(&mut self, xform: &UsdXform) -> LoadResult<SceneNode> {
        let mut node = SceneNode::group(&xform.name);
        node.transform = Transform::from_matrix(xform.transform);
        for child in &xform.children {
            if let Some(child_node) = self.convert_prim(child)? {
                node.children.push(child_node);
            }
        }
        Ok(node)
    }

    fn convert_mesh(&mut self, usd_mesh: &UsdMesh) -> LoadResult<SceneNode> {
        self.cancel.check()?;

        let indices = usd_mesh.triangulate()?;
        let mut mesh = Mesh::new(
            usd_mesh.points.clone(),
            indices,
            usd_mesh.normals.clone(),
        );

        if let Some(st) = &usd_mesh.st {
            if st.len() == usd_mesh.points.len() {
                mesh = mesh.with_uvs(st.clone());
            } else {
                log::debug!(
                    "mesh {}: primvars:st length {} doesn't match {} points, dropping",
                    usd_mesh.name,
                    st.len(),
                    usd_mesh.points.len()
                );
            }
        }

        if let Some(color) = usd_mesh.display_color {
            let index = self.material_for(&usd_mesh.name, color);
            mesh = mesh.with_material(index);
        }

        mesh.ensure_normals();

        let mut node = SceneNode::with_mesh(&usd_mesh.name, Arc::new(mesh));
        node.transform = Transform::from_matrix(usd_mesh.transform);
        Ok(node)
    }

    fn convert_reference(&mut self, reference: &UsdReference) -> LoadResult<SceneNode> {
        if self.resolving.iter().any(|p| p == &reference.asset_path) {
            return Err(LoadError::malformed(format!(
                "reference cycle through {:?}",
                reference.asset_path
            )));
        }

        let prims = self.load_layer(&reference.asset_path)?;

        self.resolving.push(reference.asset_path.clone());
        let result = self.convert_reference_inner(reference, &prims);
        self.resolving.pop();
        result
    }

    fn convert_reference_inner(
        &mut self,
        reference: &UsdReference,
        prims: &[UsdPrim],
    ) -> LoadResult<SceneNode> {
        let mut node = SceneNode::group(&reference.name);
        node.transform = Transform::from_matrix(reference.transform);

        if let Some(target) = &reference.target_prim_path {
            let matched = prims.iter().find(|prim| prim_matches_path(prim, target));
            match matched {
                Some(prim) => {
                    if let Some(child) = self.convert_prim(prim)? {
                        node.children.push(child);
                    }
                }
                None => {
                    return Err(LoadError::malformed(format!(
                        "reference target {target:?} not found in {:?}",
                        reference.asset_path
                    )))
                }
            }
        } else {
            for prim in prims {
                if let Some(child) = self.convert_prim(prim)? {
                    node.children.push(child);
                }
            }
        }

        // Overrides authored on the referencing prim
        for child in &reference.children {
            if let Some(child_node) = self.convert_prim(child)? {
                node.children.push(child_node);
            }
        }

        Ok(node)
    }

    /// Load and parse a referenced layer, with caching.
    ///
    /// Stage metadata of referenced layers is ignored; the root layer's
    /// upAxis and metersPerUnit govern the whole scene.
    fn load_layer(&mut self, asset_path: &str) -> LoadResult<Vec<UsdPrim>> {
        if let Some(cached) = self.layer_cache.get(asset_path) {
            return Ok(cached.clone());
        }

        self.cancel.check()?;
        let content = self.resolver.read_layer(asset_path)?;
        let stage = parser::parse_usda(&content)?;
        self.layer_cache
            .insert(asset_path.to_string(), stage.prims.clone());
        Ok(stage.prims)
    }

    fn material_for(&mut self, name: &str, color: Vec3) -> usize {
        if let Some(index) = self.materials.iter().position(|m| m.base_color == color) {
            return index;
        }
        self.materials.push(Arc::new(Material::new(name, color)));
        self.materials.len() - 1
    }
}

/// Match a root prim against a reference target path, by full path or by
/// trailing component.
fn prim_matches_path(prim: &UsdPrim, target: &str) -> bool {
    prim.path()
        .is_some_and(|path| path == target || path.ends_with(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const TRIANGLE: &str = r#"#usda 1.0
(
    upAxis = "Y"
    metersPerUnit = 1.0
)

def Xform "Root"
{
    def Mesh "Tri"
    {
        point3f[] points = [(0, 0, 0), (1, 0, 0), (0.5, 1, 0)]
        int[] faceVertexCounts = [3]
        int[] faceVertexIndices = [0, 1, 2]
    }
}
"#;

    struct NoResolver;

    impl AssetResolver for NoResolver {
        fn read_layer(&self, asset_path: &str) -> LoadResult<String> {
            Err(LoadError::malformed(format!(
                "unexpected reference to {asset_path:?}"
            )))
        }
    }

    fn build_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, data) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_decode_simple_layer() {
        let scene = decode_layer(TRIANGLE, &NoResolver, &CancelFlag::new()).unwrap();

        assert_eq!(scene.root.mesh_count(), 1);
        assert_eq!(scene.root.triangle_count(), 1);
        assert_eq!(scene.meters_per_unit, 1.0);
    }

    #[test]
    fn test_stage_defaults_are_centimeters() {
        let text = r#"#usda 1.0
def Mesh "Tri"
{
    point3f[] points = [(0, 0, 0), (1, 0, 0), (0.5, 1, 0)]
    int[] faceVertexCounts = [3]
    int[] faceVertexIndices = [0, 1, 2]
}
"#;
        let scene = decode_layer(text, &NoResolver, &CancelFlag::new()).unwrap();
        assert_eq!(scene.meters_per_unit, 0.01);
    }

    #[test]
    fn test_display_color_becomes_material() {
        let text = r#"#usda 1.0
def Mesh "Tri"
{
    point3f[] points = [(0, 0, 0), (1, 0, 0), (0.5, 1, 0)]
    int[] faceVertexCounts = [3]
    int[] faceVertexIndices = [0, 1, 2]
    color3f[] primvars:displayColor = [(0.2, 0.4, 0.6)]
}
"#;
        let scene = decode_layer(text, &NoResolver, &CancelFlag::new()).unwrap();

        assert_eq!(scene.materials.len(), 1);
        assert_eq!(scene.materials[0].base_color, Vec3::new(0.2, 0.4, 0.6));
        let mesh = scene.root.children[0].mesh.as_ref().unwrap();
        assert_eq!(mesh.material, Some(0));
    }

    #[test]
    fn test_layer_without_geometry_is_malformed() {
        let text = "#usda 1.0\ndef Xform \"Empty\"\n{\n}\n";
        let err = decode_layer(text, &NoResolver, &CancelFlag::new()).unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)));
    }

    #[test]
    fn test_usdz_skips_non_layer_entries() {
        let archive = build_archive(&[
            ("thumbnail.png", b"\x89PNG fake".as_slice()),
            ("scene.usda", TRIANGLE.as_bytes()),
        ]);

        let scene = decode_usdz_bytes(&archive, &CancelFlag::new()).unwrap();
        assert_eq!(scene.root.triangle_count(), 1);
    }

    #[test]
    fn test_usdz_without_layer_is_malformed() {
        let archive = build_archive(&[("thumbnail.png", b"\x89PNG fake".as_slice())]);

        let err = decode_usdz_bytes(&archive, &CancelFlag::new()).unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)));
    }

    #[test]
    fn test_usdc_payload_is_unsupported() {
        let archive = build_archive(&[("scene.usdc", b"PXR-USDC...".as_slice())]);

        let err = decode_usdz_bytes(&archive, &CancelFlag::new()).unwrap_err();
        assert!(matches!(err, LoadError::Unsupported(_)));
    }

    #[test]
    fn test_garbage_archive_is_malformed() {
        let err = decode_usdz_bytes(b"not a zip archive", &CancelFlag::new()).unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)));
    }

    #[test]
    fn test_reference_into_archive_entry() {
        let part = r#"#usda 1.0
def Mesh "Part"
{
    point3f[] points = [(0, 0, 0), (1, 0, 0), (0.5, 1, 0)]
    int[] faceVertexCounts = [3]
    int[] faceVertexIndices = [0, 1, 2]
}
"#;
        let root = r#"#usda 1.0
def Xform "Assembly"
{
    def Xform "Left" (
        references = @./part.usda@</Part>
    )
    {
        double3 xformOp:translate = (-2, 0, 0)
    }

    def Xform "Right" (
        references = @./part.usda@</Part>
    )
    {
        double3 xformOp:translate = (2, 0, 0)
    }
}
"#;
        let archive = build_archive(&[
            ("scene.usda", root.as_bytes()),
            ("part.usda", part.as_bytes()),
        ]);

        let scene = decode_usdz_bytes(&archive, &CancelFlag::new()).unwrap();
        assert_eq!(scene.root.mesh_count(), 2);

        // Both instances carry their own transforms
        let bounds = scene.root.world_bounds();
        assert!(bounds.min().x < -1.0);
        assert!(bounds.max().x > 1.0);
    }

    #[test]
    fn test_missing_reference_entry_is_malformed() {
        let root = r#"#usda 1.0
def Xform "A" (
    references = @./missing.usda@
)
{
}
"#;
        let archive = build_archive(&[("scene.usda", root.as_bytes())]);

        let err = decode_usdz_bytes(&archive, &CancelFlag::new()).unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)));
    }

    #[test]
    fn test_reference_cycle_is_malformed() {
        let a = "#usda 1.0\ndef Xform \"A\" (references = @./b.usda@)\n{\n}\n";
        let b = "#usda 1.0\ndef Xform \"B\" (references = @./a.usda@)\n{\n}\n";
        let archive = build_archive(&[
            ("a.usda", a.as_bytes()),
            ("b.usda", b.as_bytes()),
        ]);

        let err = decode_usdz_bytes(&archive, &CancelFlag::new()).unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)));
    }

    #[test]
    fn test_out_of_range_face_index_is_malformed() {
        let text = r#"#usda 1.0
def Mesh "Tri"
{
    point3f[] points = [(0, 0, 0), (1, 0, 0), (0.5, 1, 0)]
    int[] faceVertexCounts = [3]
    int[] faceVertexIndices = [0, 1, 9]
}
"#;
        let err = decode_layer(text, &NoResolver, &CancelFlag::new()).unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)));
    }

    #[test]
    fn test_cancelled_decode_short_circuits() {
        let cancel = CancelFlag::new();
        cancel.cancel();

        let err = decode_layer(TRIANGLE, &NoResolver, &cancel).unwrap_err();
        assert!(matches!(err, LoadError::Cancelled));
    }

    #[test]
    fn test_uv_channel_preserved_when_aligned() {
        let text = r#"#usda 1.0
def Mesh "Tri"
{
    point3f[] points = [(0, 0, 0), (1, 0, 0), (0.5, 1, 0)]
    int[] faceVertexCounts = [3]
    int[] faceVertexIndices = [0, 1, 2]
    normal3f[] normals = [(0, 0, 1), (0, 0, 1), (0, 0, 1)]
    texCoord2f[] primvars:st = [(0, 0), (1, 0), (0.5, 1)]
}
"#;
        let scene = decode_layer(text, &NoResolver, &CancelFlag::new()).unwrap();
        let mesh = scene.root.children[0].mesh.as_ref().unwrap();
        assert!(mesh.has_uvs());
        assert_eq!(mesh.uvs.as_ref().unwrap()[2], [0.5, 1.0]);
    }
}
