//! Wavefront OBJ decoder, with companion MTL material support.
//!
//! OBJ is a line-oriented text format with global vertex pools and 1-based
//! (or negative, relative) face indices. Faces may be polygons; anything with
//! more than 3 corners is fan-triangulated. Each `o`/`g` statement starts a
//! new scene node, and a `usemtl` change within an object splits the geometry
//! into a sibling node so each mesh carries a single material index.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use plinth_math::Vec3;

use crate::builder::SourceScene;
use crate::error::{LoadError, LoadResult};
use crate::loader::CancelFlag;
use crate::material::Material;
use crate::mesh::Mesh;
use crate::scene::SceneNode;

/// Decode an OBJ file from disk. The companion MTL (if named by `mtllib`)
/// is resolved relative to the OBJ's directory.
pub fn decode(path: &Path, cancel: &CancelFlag) -> LoadResult<SourceScene> {
    let text = std::fs::read_to_string(path)?;
    decode_str(&text, path.parent(), cancel)
}

/// Decode OBJ text. `base_dir` anchors `mtllib` lookups; when it is `None`
/// material libraries are skipped with a warning.
pub fn decode_str(
    text: &str,
    base_dir: Option<&Path>,
    cancel: &CancelFlag,
) -> LoadResult<SourceScene> {
    let mut decoder = ObjDecoder::default();

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((k, r)) => (k, r.trim()),
            None => (line, ""),
        };

        match keyword {
            "v" => decoder.positions.push(parse_vec3(rest, line_no)?),
            "vn" => decoder.normals.push(parse_vec3(rest, line_no)?),
            "vt" => decoder.uvs.push(parse_uv(rest, line_no)?),
            "f" => decoder.add_face(rest, line_no)?,
            "o" | "g" => {
                cancel.check()?;
                decoder.start_object(rest);
            }
            "usemtl" => decoder.use_material(rest),
            "mtllib" => decoder.load_mtl(rest, base_dir),
            // s (smoothing groups), l (lines), p (points) carry nothing we place
            _ => {}
        }
    }
    cancel.check()?;

    decoder.finish()
}

/// Resolved face corner: indices into the global pools.
type Corner = (usize, Option<usize>, Option<usize>);

#[derive(Default)]
struct ObjDecoder {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<[f32; 2]>,

    materials: Vec<Arc<Material>>,
    material_names: HashMap<String, usize>,
    current_material: Option<usize>,

    current_name: String,
    current: MeshBuilder,
    nodes: Vec<SceneNode>,
}

impl ObjDecoder {
    fn start_object(&mut self, name: &str) {
        self.flush();
        self.current_name = name.to_string();
    }

    fn use_material(&mut self, name: &str) {
        let index = match self.material_names.get(name) {
            Some(&i) => i,
            None => {
                // usemtl before (or without) a matching mtllib entry: keep the
                // slot so indices stay stable and the host sees the name.
                log::warn!("OBJ references undefined material '{name}'");
                let i = self.materials.len();
                self.materials.push(Arc::new(Material {
                    name: name.to_string(),
                    ..Default::default()
                }));
                self.material_names.insert(name.to_string(), i);
                i
            }
        };

        if self.current_material != Some(index) {
            // Material change splits the mesh; emit what we have so far
            self.flush();
            self.current_material = Some(index);
        }
    }

    fn load_mtl(&mut self, name: &str, base_dir: Option<&Path>) {
        let Some(dir) = base_dir else {
            log::warn!("no base directory to resolve material library '{name}'");
            return;
        };
        let path = dir.join(name);
        match std::fs::read_to_string(&path) {
            Ok(text) => parse_mtl(&text, &mut self.materials, &mut self.material_names),
            Err(err) => {
                // A missing companion MTL degrades to default materials
                log::warn!("failed to read material library {:?}: {err}", path);
            }
        }
    }

    fn add_face(&mut self, rest: &str, line_no: usize) -> LoadResult<()> {
        let mut corners: Vec<Corner> = Vec::new();
        for token in rest.split_whitespace() {
            corners.push(self.resolve_corner(token, line_no)?);
        }

        if corners.len() < 3 {
            return Err(LoadError::malformed(format!(
                "line {}: face with {} vertices",
                line_no + 1,
                corners.len()
            )));
        }

        // Fan triangulation: (0,1,2), (0,2,3), ...
        for i in 1..corners.len() - 1 {
            for corner in [corners[0], corners[i], corners[i + 1]] {
                let index = self.current.corner_index(
                    corner,
                    &self.positions,
                    &self.normals,
                    &self.uvs,
                );
                self.current.indices.push(index);
            }
        }
        Ok(())
    }

    /// Resolve one `v`, `v/vt`, `v//vn` or `v/vt/vn` token against the pools.
    fn resolve_corner(&self, token: &str, line_no: usize) -> LoadResult<Corner> {
        let mut parts = token.split('/');
        let v = parts.next().unwrap_or("");
        let vt = parts.next().unwrap_or("");
        let vn = parts.next().unwrap_or("");

        let v = resolve_index(v, self.positions.len(), line_no)?.ok_or_else(|| {
            LoadError::malformed(format!("line {}: face corner without position", line_no + 1))
        })?;
        let vt = resolve_index(vt, self.uvs.len(), line_no)?;
        let vn = resolve_index(vn, self.normals.len(), line_no)?;

        Ok((v, vt, vn))
    }

    fn flush(&mut self) {
        let builder = std::mem::take(&mut self.current);
        if builder.indices.is_empty() {
            return;
        }

        let node_name = if self.current_name.is_empty() {
            "default".to_string()
        } else {
            self.current_name.clone()
        };

        let mut mesh = builder.into_mesh(self.current_material);
        mesh.ensure_normals();
        self.nodes.push(SceneNode::with_mesh(node_name, Arc::new(mesh)));
    }

    fn finish(mut self) -> LoadResult<SourceScene> {
        self.flush();
        if self.nodes.is_empty() {
            return Err(LoadError::malformed("no geometry in OBJ file"));
        }

        log::debug!(
            "decoded OBJ: {} nodes, {} materials",
            self.nodes.len(),
            self.materials.len()
        );

        let mut root = SceneNode::group("");
        root.children = self.nodes;
        // OBJ carries no unit or axis metadata; Y-up meters by convention
        Ok(SourceScene::canonical(root, self.materials))
    }
}

/// Accumulates one mesh worth of deduplicated corners.
#[derive(Default)]
struct MeshBuilder {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
    corner_map: HashMap<Corner, u32>,
    saw_normal: bool,
    saw_uv: bool,
}

impl MeshBuilder {
    /// Get (or create) the output vertex for a resolved corner triple.
    fn corner_index(
        &mut self,
        corner: Corner,
        positions: &[Vec3],
        normals: &[Vec3],
        uvs: &[[f32; 2]],
    ) -> u32 {
        if let Some(&index) = self.corner_map.get(&corner) {
            return index;
        }

        let (v, vt, vn) = corner;
        let index = self.positions.len() as u32;
        self.positions.push(positions[v]);
        self.uvs.push(vt.map(|i| uvs[i]).unwrap_or([0.0, 0.0]));
        self.normals.push(vn.map(|i| normals[i]).unwrap_or(Vec3::ZERO));
        self.saw_uv |= vt.is_some();
        self.saw_normal |= vn.is_some();
        self.corner_map.insert(corner, index);
        index
    }

    fn into_mesh(self, material: Option<usize>) -> Mesh {
        let normals = self.saw_normal.then_some(self.normals);
        let mut mesh = Mesh::new(self.positions, self.indices, normals);
        if self.saw_uv {
            mesh = mesh.with_uvs(self.uvs);
        }
        if let Some(material) = material {
            mesh = mesh.with_material(material);
        }
        mesh
    }
}

/// Resolve a 1-based or negative (relative) OBJ index against a pool.
fn resolve_index(token: &str, pool_len: usize, line_no: usize) -> LoadResult<Option<usize>> {
    if token.is_empty() {
        return Ok(None);
    }
    let value: i64 = token.parse().map_err(|_| {
        LoadError::malformed(format!("line {}: bad index '{}'", line_no + 1, token))
    })?;

    let resolved = if value > 0 {
        (value - 1) as usize
    } else if value < 0 {
        let back = (-value) as usize;
        if back > pool_len {
            return Err(LoadError::malformed(format!(
                "line {}: relative index {} out of range",
                line_no + 1,
                value
            )));
        }
        pool_len - back
    } else {
        return Err(LoadError::malformed(format!(
            "line {}: index 0 is not valid in OBJ",
            line_no + 1
        )));
    };

    if resolved >= pool_len {
        return Err(LoadError::malformed(format!(
            "line {}: index {} out of range (pool has {})",
            line_no + 1,
            value,
            pool_len
        )));
    }
    Ok(Some(resolved))
}

fn parse_vec3(rest: &str, line_no: usize) -> LoadResult<Vec3> {
    let mut it = rest.split_whitespace();
    let mut next = || -> LoadResult<f32> {
        it.next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| LoadError::malformed(format!("line {}: expected 3 floats", line_no + 1)))
    };
    Ok(Vec3::new(next()?, next()?, next()?))
}

fn parse_uv(rest: &str, line_no: usize) -> LoadResult<[f32; 2]> {
    let mut it = rest.split_whitespace();
    let mut next = || -> LoadResult<f32> {
        it.next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| LoadError::malformed(format!("line {}: expected 2 floats", line_no + 1)))
    };
    // A third (w) component is legal and ignored
    Ok([next()?, next()?])
}

/// Parse a companion MTL library into the shared material table.
fn parse_mtl(
    text: &str,
    materials: &mut Vec<Arc<Material>>,
    names: &mut HashMap<String, usize>,
) {
    let mut current: Option<Material> = None;

    let mut commit = |mat: Option<Material>, materials: &mut Vec<Arc<Material>>| {
        if let Some(mat) = mat {
            if let Some(&i) = names.get(&mat.name) {
                // mtllib redefines a placeholder created by an earlier usemtl
                materials[i] = Arc::new(mat);
            } else {
                names.insert(mat.name.clone(), materials.len());
                materials.push(Arc::new(mat));
            }
        }
    };

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((k, r)) => (k, r.trim()),
            None => (line, ""),
        };

        match keyword {
            "newmtl" => {
                commit(current.take(), materials);
                current = Some(Material {
                    name: rest.to_string(),
                    ..Default::default()
                });
            }
            "Kd" => {
                if let (Some(mat), Ok(color)) = (current.as_mut(), parse_vec3(rest, 0)) {
                    mat.base_color = color;
                }
            }
            "map_Kd" => {
                if let Some(mat) = current.as_mut() {
                    mat.base_color_texture = Some(rest.to_string());
                }
            }
            _ => {}
        }
    }
    commit(current, materials);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_obj(text: &str) -> LoadResult<SourceScene> {
        decode_str(text, None, &CancelFlag::new())
    }

    #[test]
    fn test_decode_triangle() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let scene = decode_obj(obj).unwrap();

        assert_eq!(scene.root.children.len(), 1);
        let mesh = scene.root.children[0].mesh.as_ref().unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        // No normals in the source: flat fallback computed them
        assert!(mesh.has_normals());
    }

    #[test]
    fn test_fan_triangulation_of_pentagon() {
        let obj = "\
v 0 0 0
v 1 0 0
v 1.5 1 0
v 0.5 2 0
v -0.5 1 0
vn 0 0 1
f 1//1 2//1 3//1 4//1 5//1
";
        let scene = decode_obj(obj).unwrap();
        let mesh = scene.root.children[0].mesh.as_ref().unwrap();

        // 5-gon fans into 3 triangles; 5 unique corners survive dedup
        assert_eq!(mesh.triangle_count(), 3);
        assert_eq!(mesh.vertex_count(), 5);
        assert_eq!(
            mesh.indices,
            vec![0, 1, 2, 0, 2, 3, 0, 3, 4]
        );
    }

    #[test]
    fn test_negative_indices() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let scene = decode_obj(obj).unwrap();
        assert_eq!(scene.root.children[0].mesh.as_ref().unwrap().triangle_count(), 1);
    }

    #[test]
    fn test_out_of_range_index_is_malformed() {
        let obj = "v 0 0 0\nv 1 0 0\nf 1 2 9\n";
        let err = decode_obj(obj).unwrap_err();
        assert!(matches!(err, LoadError::Malformed(_)), "got {err:?}");
    }

    #[test]
    fn test_degenerate_face_is_malformed() {
        let obj = "v 0 0 0\nv 1 0 0\nf 1 2\n";
        assert!(matches!(decode_obj(obj), Err(LoadError::Malformed(_))));
    }

    #[test]
    fn test_empty_file_is_malformed() {
        assert!(matches!(
            decode_obj("# nothing here\n"),
            Err(LoadError::Malformed(_))
        ));
    }

    #[test]
    fn test_objects_become_nodes() {
        let obj = "\
o first
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o second
v 0 0 1
v 1 0 1
v 0 1 1
f 4 5 6
";
        let scene = decode_obj(obj).unwrap();
        assert_eq!(scene.root.children.len(), 2);
        assert_eq!(scene.root.children[0].name, "first");
        assert_eq!(scene.root.children[1].name, "second");
    }

    #[test]
    fn test_usemtl_without_library_creates_placeholder() {
        let obj = "usemtl brass\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let scene = decode_obj(obj).unwrap();

        assert_eq!(scene.materials.len(), 1);
        assert_eq!(scene.materials[0].name, "brass");
        assert_eq!(scene.root.children[0].mesh.as_ref().unwrap().material, Some(0));
    }

    #[test]
    fn test_material_change_splits_mesh() {
        let obj = "\
v 0 0 0
v 1 0 0
v 0 1 0
usemtl a
f 1 2 3
usemtl b
f 1 2 3
";
        let scene = decode_obj(obj).unwrap();
        assert_eq!(scene.root.children.len(), 2);
        assert_eq!(scene.root.children[0].mesh.as_ref().unwrap().material, Some(0));
        assert_eq!(scene.root.children[1].mesh.as_ref().unwrap().material, Some(1));
    }

    #[test]
    fn test_mtl_parsing() {
        let mut materials = Vec::new();
        let mut names = HashMap::new();
        parse_mtl(
            "newmtl red\nKd 1.0 0.0 0.0\nmap_Kd red.png\n\nnewmtl blue\nKd 0 0 1\n",
            &mut materials,
            &mut names,
        );

        assert_eq!(materials.len(), 2);
        assert_eq!(materials[0].base_color, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(materials[0].base_color_texture.as_deref(), Some("red.png"));
        assert_eq!(names.get("blue"), Some(&1));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let obj = "\
o pent
v 0 0 0
v 1 0 0
v 1.5 1 0
v 0.5 2 0
v -0.5 1 0
f 1 2 3 4 5
";
        let a = decode_obj(obj).unwrap();
        let b = decode_obj(obj).unwrap();

        let ma = a.root.children[0].mesh.as_ref().unwrap();
        let mb = b.root.children[0].mesh.as_ref().unwrap();
        assert_eq!(ma.indices, mb.indices);
        assert_eq!(ma.positions, mb.positions);
        assert_eq!(a.root.node_count(), b.root.node_count());
    }

    #[test]
    fn test_cancel_checked_between_objects() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let obj = "o x\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        assert!(matches!(
            decode_str(obj, None, &cancel),
            Err(LoadError::Cancelled)
        ));
    }
}
