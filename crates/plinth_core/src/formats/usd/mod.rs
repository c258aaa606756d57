//! USD support: USDA text layers and USDZ packages.
//!
//! The pipeline is parse (USDA text into prims), then convert (prims into
//! the scene graph, resolving reference arcs). Binary crate layers (`.usdc`)
//! are recognized but not decoded.

pub mod loader;
pub mod parser;
pub mod types;

pub use loader::{decode_usda, decode_usdz};
