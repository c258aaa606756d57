// Re-export glam for convenience
pub use glam::*;

// Plinth math types
mod aabb;
mod interval;

pub use aabb::Aabb;
pub use interval::Interval;
