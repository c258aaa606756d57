//! Mesh geometry representation for the plinth scene graph.
//!
//! This module provides a GPU-agnostic mesh representation that decoders
//! populate from various file formats (USDZ, glTF, OBJ) and that the
//! rendering collaborator converts to vertex buffers. A mesh is immutable
//! after decode; the only mutation point is the flat-normal fallback applied
//! before the mesh is frozen into the scene graph.

use bytemuck::{Pod, Zeroable};
use plinth_math::{Aabb, Vec3};

/// A mesh consisting of vertex positions, optional normals and UVs, and
/// triangle indices.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional - flat normals are generated if not provided)
    pub normals: Option<Vec<Vec3>>,

    /// UV coordinates (optional - one [u, v] per vertex)
    pub uvs: Option<Vec<[f32; 2]>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Index into the asset's material table, if any
    pub material: Option<usize>,
}

impl Mesh {
    /// Create a new mesh from positions and indices, optionally with normals.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, normals: Option<Vec<Vec3>>) -> Self {
        Self {
            positions,
            normals,
            uvs: None,
            indices,
            material: None,
        }
    }

    /// Set the UV channel.
    pub fn with_uvs(mut self, uvs: Vec<[f32; 2]>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    /// Set the material table index.
    pub fn with_material(mut self, material: usize) -> Self {
        self.material = Some(material);
        self
    }

    /// Compute the axis-aligned bounding box of the positions.
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for pos in &self.positions {
            bounds.grow(*pos);
        }
        bounds
    }

    /// Check if the mesh has normals.
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Check if the mesh has UV coordinates.
    pub fn has_uvs(&self) -> bool {
        self.uvs.is_some()
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Ensure the mesh has a usable normal channel.
    ///
    /// Sources that provide per-vertex normals keep their topology untouched.
    /// A missing or mismatched normal channel (e.g. face-varying data that
    /// doesn't line up with the vertex count) falls back to flat normals.
    pub fn ensure_normals(&mut self) {
        let usable = matches!(&self.normals, Some(n) if n.len() == self.positions.len());
        if !usable {
            if self.normals.is_some() {
                log::debug!(
                    "normal channel length doesn't match vertex count ({} vs {}), regenerating",
                    self.normals.as_ref().map(Vec::len).unwrap_or(0),
                    self.positions.len()
                );
            }
            self.compute_flat_normals();
        }
    }

    /// Replace the vertex stream with per-face vertices carrying flat normals.
    ///
    /// Each triangle gets its own three vertices with the geometric face
    /// normal, so shared vertices are split and the index buffer becomes
    /// 0..n. Degenerate triangles get a +Y normal.
    pub fn compute_flat_normals(&mut self) {
        let mut positions = Vec::with_capacity(self.indices.len());
        let mut normals = Vec::with_capacity(self.indices.len());
        let mut uvs = self.uvs.as_ref().map(|_| Vec::with_capacity(self.indices.len()));

        for tri in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            if i0 >= self.positions.len() || i1 >= self.positions.len() || i2 >= self.positions.len()
            {
                // Out-of-range indices are rejected at decode time; skip here.
                continue;
            }

            let p0 = self.positions[i0];
            let p1 = self.positions[i1];
            let p2 = self.positions[i2];

            let face_normal = (p1 - p0).cross(p2 - p0);
            let normal = if face_normal.length_squared() > 0.0 {
                face_normal.normalize()
            } else {
                Vec3::Y
            };

            positions.extend_from_slice(&[p0, p1, p2]);
            normals.extend_from_slice(&[normal; 3]);
            if let (Some(out), Some(src)) = (uvs.as_mut(), self.uvs.as_ref()) {
                for i in [i0, i1, i2] {
                    out.push(src.get(i).copied().unwrap_or([0.0, 0.0]));
                }
            }
        }

        self.indices = (0..positions.len() as u32).collect();
        self.positions = positions;
        self.normals = Some(normals);
        self.uvs = uvs;
    }

    /// Interleave the mesh into packed vertices for the rendering collaborator.
    ///
    /// Missing normal/UV channels are zero-filled; callers that need shading
    /// should run [`Mesh::ensure_normals`] first.
    pub fn to_vertices(&self) -> Vec<Vertex> {
        let mut vertices = Vec::with_capacity(self.positions.len());
        for (i, pos) in self.positions.iter().enumerate() {
            let normal = self
                .normals
                .as_ref()
                .and_then(|n| n.get(i))
                .copied()
                .unwrap_or(Vec3::ZERO);
            let uv = self
                .uvs
                .as_ref()
                .and_then(|u| u.get(i))
                .copied()
                .unwrap_or([0.0, 0.0]);
            vertices.push(Vertex {
                position: pos.to_array(),
                normal: normal.to_array(),
                uv,
            });
        }
        vertices
    }
}

/// Packed interleaved vertex handed to the rendering collaborator.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}
