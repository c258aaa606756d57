//! Scene graph builder: normalize decoder output into a placeable asset.
//!
//! Decoders converge on [`SourceScene`], which still carries source-format
//! conventions (up axis, unit scale). The builder folds those into a single
//! named root so every [`crate::scene::Asset`] is meters, Y-up, one root.
//! The build is pure and deterministic: the same decoded input always yields
//! the same tree shape and transforms, and no new error kinds are introduced.

use std::sync::Arc;

use plinth_math::{Quat, Vec3};

use crate::material::Material;
use crate::scene::{Asset, SceneNode, Transform};

/// Canonical up axis of a source format or USD stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UpAxis {
    /// Y-up, the canonical output convention (glTF, OBJ)
    #[default]
    Y,
    /// Z-up, converted by a -90 degree rotation about X
    Z,
}

/// Decoder output before normalization.
#[derive(Clone, Debug)]
pub struct SourceScene {
    /// Root of the decoded node tree
    pub root: SceneNode,

    /// Material table referenced by mesh material indices
    pub materials: Vec<Arc<Material>>,

    /// Authoring-time up axis
    pub up_axis: UpAxis,

    /// Authoring-time unit scale (1.0 = meters)
    pub meters_per_unit: f32,
}

impl SourceScene {
    /// A source scene already in canonical conventions (Y-up, meters).
    pub fn canonical(root: SceneNode, materials: Vec<Arc<Material>>) -> Self {
        Self {
            root,
            materials,
            up_axis: UpAxis::Y,
            meters_per_unit: 1.0,
        }
    }
}

/// Normalize a decoded scene into a single-rooted, meters, Y-up asset.
pub fn build(source: SourceScene, name: &str) -> Asset {
    let SourceScene {
        root,
        materials,
        up_axis,
        meters_per_unit,
    } = source;

    let rotation = match up_axis {
        UpAxis::Y => Quat::IDENTITY,
        UpAxis::Z => Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2),
    };
    let scale = if meters_per_unit > 0.0 {
        meters_per_unit
    } else {
        log::warn!("non-positive metersPerUnit {meters_per_unit}, assuming meters");
        1.0
    };

    let mut normalized = SceneNode::group(name);
    normalized.transform = Transform {
        translation: Vec3::ZERO,
        rotation,
        scale: Vec3::splat(scale),
    };
    normalized.children.push(root);

    log::debug!(
        "built asset '{}': {} nodes, {} meshes, {} triangles",
        name,
        normalized.node_count(),
        normalized.mesh_count(),
        normalized.triangle_count()
    );

    Asset {
        root: normalized,
        materials,
    }
}
