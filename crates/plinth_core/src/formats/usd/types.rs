//! USD primitive types for the intermediate representation.
//!
//! These types represent parsed USD prims before conversion to the plinth
//! scene graph.

use plinth_math::{Mat4, Vec3};

use crate::builder::UpAxis;
use crate::error::{LoadError, LoadResult};

/// Stage-level metadata from the layer's leading parenthesized block.
#[derive(Clone, Debug)]
pub struct StageMeta {
    /// Authoring up axis (USD default is Y)
    pub up_axis: UpAxis,

    /// Scale of one stage unit in meters (USD default is 0.01, centimeters)
    pub meters_per_unit: f32,

    /// Prim the stage designates as its default root
    pub default_prim: Option<String>,
}

impl Default for StageMeta {
    fn default() -> Self {
        Self {
            up_axis: UpAxis::Y,
            meters_per_unit: 0.01,
            default_prim: None,
        }
    }
}

/// A parsed USDA layer: stage metadata plus root prims.
#[derive(Clone, Debug, Default)]
pub struct UsdStage {
    pub meta: StageMeta,
    pub prims: Vec<UsdPrim>,
}

/// A parsed USD prim.
#[derive(Clone, Debug)]
pub enum UsdPrim {
    /// A transform (or Scope) grouping node
    Xform(UsdXform),

    /// A mesh geometry
    Mesh(UsdMesh),

    /// A reference to another layer (external file or archive entry)
    Reference(UsdReference),

    /// An unknown or unsupported prim type (skipped)
    Unknown(String),
}

impl UsdPrim {
    /// Prim path within its layer, if it has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            UsdPrim::Xform(x) => Some(&x.path),
            UsdPrim::Mesh(m) => Some(&m.path),
            UsdPrim::Reference(r) => Some(&r.path),
            UsdPrim::Unknown(_) => None,
        }
    }
}

/// A USD Xform (or Scope) prim.
#[derive(Clone, Debug, Default)]
pub struct UsdXform {
    /// Prim path (e.g., "/World/Model")
    pub path: String,

    /// Prim name (last component of path)
    pub name: String,

    /// Combined transform matrix from xformOps
    pub transform: Mat4,

    /// Child prims
    pub children: Vec<UsdPrim>,
}

/// A USD Mesh prim.
#[derive(Clone, Debug, Default)]
pub struct UsdMesh {
    /// Prim path
    pub path: String,

    /// Prim name
    pub name: String,

    /// Vertex positions
    pub points: Vec<Vec3>,

    /// Number of vertices per face (for triangulation)
    pub face_vertex_counts: Vec<i32>,

    /// Vertex indices for each face
    pub face_vertex_indices: Vec<i32>,

    /// Vertex normals (optional)
    pub normals: Option<Vec<Vec3>>,

    /// Texture coordinates from primvars:st (optional)
    pub st: Option<Vec<[f32; 2]>>,

    /// First primvars:displayColor entry, if authored
    pub display_color: Option<Vec3>,

    /// True when orientation = "leftHanded"
    pub left_handed: bool,

    /// Local transform
    pub transform: Mat4,
}

impl UsdMesh {
    /// Triangulate the mesh and return indices suitable for the scene graph.
    ///
    /// USD meshes can have n-gons (faces with more than 3 vertices); these
    /// are converted with fan triangulation. Left-handed meshes have their
    /// winding flipped to the canonical counter-clockwise order. Indices out
    /// of range of the point array are rejected.
    pub fn triangulate(&self) -> LoadResult<Vec<u32>> {
        let point_count = self.points.len();
        let mut indices = Vec::new();
        let mut offset = 0usize;

        for &count in &self.face_vertex_counts {
            if count < 3 {
                return Err(LoadError::malformed(format!(
                    "mesh {}: face with {count} vertices",
                    self.path
                )));
            }
            let count = count as usize;
            if offset + count > self.face_vertex_indices.len() {
                return Err(LoadError::malformed(format!(
                    "mesh {}: faceVertexIndices shorter than faceVertexCounts",
                    self.path
                )));
            }

            let corner = |i: usize| -> LoadResult<u32> {
                let value = self.face_vertex_indices[offset + i];
                if value < 0 || value as usize >= point_count {
                    return Err(LoadError::malformed(format!(
                        "mesh {}: index {value} out of range ({point_count} points)",
                        self.path
                    )));
                }
                Ok(value as u32)
            };

            // Fan triangulation: (0,1,2), (0,2,3), ... (0,n-2,n-1)
            for i in 1..count - 1 {
                let (i0, i1, i2) = (corner(0)?, corner(i)?, corner(i + 1)?);
                if self.left_handed {
                    indices.extend_from_slice(&[i0, i2, i1]);
                } else {
                    indices.extend_from_slice(&[i0, i1, i2]);
                }
            }
            offset += count;
        }

        Ok(indices)
    }
}

/// A USD reference to another layer.
/// Syntax: `references = @path/to/file.usda@</PrimPath>`
#[derive(Clone, Debug, Default)]
pub struct UsdReference {
    /// Prim path in the current layer
    pub path: String,

    /// Prim name
    pub name: String,

    /// Path of the referenced layer (file path or archive entry)
    pub asset_path: String,

    /// Optional prim path within the referenced layer
    pub target_prim_path: Option<String>,

    /// Local transform applied to the reference
    pub transform: Mat4,

    /// Child prims (overrides or additional content)
    pub children: Vec<UsdPrim>,
}

/// Transform operation types found in USD xformOps.
#[derive(Clone, Debug)]
pub enum XformOp {
    /// Translation (xformOp:translate)
    Translate(Vec3),

    /// Rotation in degrees around a single axis
    RotateX(f32),
    RotateY(f32),
    RotateZ(f32),

    /// Euler rotation XYZ in degrees
    RotateXYZ(Vec3),

    /// Scale (uniform or non-uniform)
    Scale(Vec3),
}

impl XformOp {
    /// Convert this operation to a transformation matrix.
    pub fn to_matrix(&self) -> Mat4 {
        match self {
            XformOp::Translate(t) => Mat4::from_translation(*t),
            XformOp::RotateX(deg) => Mat4::from_rotation_x(deg.to_radians()),
            XformOp::RotateY(deg) => Mat4::from_rotation_y(deg.to_radians()),
            XformOp::RotateZ(deg) => Mat4::from_rotation_z(deg.to_radians()),
            XformOp::RotateXYZ(euler) => {
                Mat4::from_rotation_x(euler.x.to_radians())
                    * Mat4::from_rotation_y(euler.y.to_radians())
                    * Mat4::from_rotation_z(euler.z.to_radians())
            }
            XformOp::Scale(s) => Mat4::from_scale(*s),
        }
    }
}

/// Combine a list of xformOps into a single matrix.
pub fn compose_xform_ops(ops: &[XformOp]) -> Mat4 {
    let mut result = Mat4::IDENTITY;
    for op in ops {
        result = result * op.to_matrix();
    }
    result
}
