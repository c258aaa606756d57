//! Material definitions shared by all decoders.
//!
//! Materials are owned by the decoded asset and shared read-only with the
//! rendering collaborator via `Arc`. Texture references are paths (or archive
//! entry names) that the host resolves; this crate never decodes image bytes.

use plinth_math::Vec3;

/// A PBR-lite material: base color plus metallic/roughness factors.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Material name (from the source file, may be empty)
    pub name: String,

    /// Base color factor (RGB, 0-1)
    pub base_color: Vec3,

    /// Metallic factor (0=dielectric, 1=metal)
    pub metallic: f32,

    /// Roughness factor (0=smooth, 1=rough)
    pub roughness: f32,

    /// Reference to the base color texture (file path or archive entry)
    pub base_color_texture: Option<String>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_color: Vec3::new(0.5, 0.5, 0.5), // Grey default
            metallic: 0.0,
            roughness: 0.5,
            base_color_texture: None,
        }
    }
}

impl Material {
    /// Create a new material with just a name and base color.
    pub fn new(name: impl Into<String>, base_color: Vec3) -> Self {
        Self {
            name: name.into(),
            base_color,
            ..Default::default()
        }
    }

    /// Check if this material references a texture.
    pub fn has_texture(&self) -> bool {
        self.base_color_texture.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_material() {
        let mat = Material::default();
        assert_eq!(mat.base_color, Vec3::new(0.5, 0.5, 0.5));
        assert!(!mat.has_texture());
    }

    #[test]
    fn test_named_material() {
        let mat = Material::new("brass", Vec3::new(0.8, 0.6, 0.2));
        assert_eq!(mat.name, "brass");
        assert_eq!(mat.base_color.x, 0.8);
    }
}
