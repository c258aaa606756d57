//! Scene graph types for plinth.
//!
//! This module defines the normalized, renderer-agnostic scene representation
//! that every decoder converges on. A decoded asset is a single rooted tree
//! of [`SceneNode`]s; each node exclusively owns its children, so the graph is
//! acyclic by construction.

use std::sync::Arc;

use plinth_math::{Aabb, Mat4, Quat, Vec3};

use crate::material::Material;
use crate::mesh::Mesh;

/// Transform components that can be composed into a matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    /// Translation
    pub translation: Vec3,

    /// Rotation (as quaternion)
    pub rotation: Quat,

    /// Scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a new transform with only translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Create a new transform from a 4x4 matrix.
    ///
    /// Decomposes the matrix into translation, rotation, and scale.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Convert to a 4x4 transformation matrix.
    ///
    /// Order: Scale -> Rotate -> Translate (SRT)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Compose two transforms (`self` applied after `other`).
    pub fn compose(&self, other: &Transform) -> Transform {
        Transform::from_matrix(self.to_matrix() * other.to_matrix())
    }
}

/// A node in the normalized scene graph.
///
/// Nodes exclusively own their children; meshes are shared read-only with the
/// host via `Arc` once placement hands the tree over.
#[derive(Clone, Debug, Default)]
pub struct SceneNode {
    /// Node name (from the source file, may be empty)
    pub name: String,

    /// Local transform relative to the parent
    pub transform: Transform,

    /// Geometry attached to this node, if any
    pub mesh: Option<Arc<Mesh>>,

    /// Child nodes (exclusively owned)
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Create an empty group node.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            mesh: None,
            children: Vec::new(),
        }
    }

    /// Create a leaf node carrying a mesh.
    pub fn with_mesh(name: impl Into<String>, mesh: Arc<Mesh>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            mesh: Some(mesh),
            children: Vec::new(),
        }
    }

    /// Total number of nodes in this subtree (including self).
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }

    /// Total number of meshes in this subtree.
    pub fn mesh_count(&self) -> usize {
        usize::from(self.mesh.is_some())
            + self.children.iter().map(SceneNode::mesh_count).sum::<usize>()
    }

    /// Total number of triangles in this subtree.
    pub fn triangle_count(&self) -> usize {
        self.mesh.as_ref().map(|m| m.triangle_count()).unwrap_or(0)
            + self
                .children
                .iter()
                .map(SceneNode::triangle_count)
                .sum::<usize>()
    }

    /// Visit every node in the subtree, depth-first, with its world matrix.
    pub fn visit(&self, mut f: impl FnMut(&SceneNode, Mat4)) {
        self.visit_inner(Mat4::IDENTITY, &mut f);
    }

    fn visit_inner(&self, parent: Mat4, f: &mut impl FnMut(&SceneNode, Mat4)) {
        let world = parent * self.transform.to_matrix();
        f(self, world);
        for child in &self.children {
            child.visit_inner(world, f);
        }
    }

    /// Compute the world-space bounding box of all meshes in the subtree.
    pub fn world_bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        self.visit(|node, world| {
            if let Some(mesh) = &node.mesh {
                bounds = Aabb::surrounding(&bounds, &mesh.bounds().transformed(world));
            }
        });
        bounds
    }
}

/// A fully decoded and normalized asset: one rooted scene tree plus the
/// material table its meshes index into.
#[derive(Clone, Debug, Default)]
pub struct Asset {
    /// The single root of the scene tree
    pub root: SceneNode,

    /// Materials referenced by mesh material indices
    pub materials: Vec<Arc<Material>>,
}

impl Asset {
    /// Look up a material by mesh material index.
    pub fn material(&self, index: usize) -> Option<&Arc<Material>> {
        self.materials.get(index)
    }
}
