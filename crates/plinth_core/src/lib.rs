//! Plinth core - asset decoding and scene graph pipeline.
//!
//! This crate turns a picked 3D asset file (USDZ/glTF/OBJ) into a
//! normalized, renderer-agnostic scene graph:
//!
//! - **Format sniffing**: extension first, header magic as fallback
//! - **Decoders**: isolated per-format parsers converging on one output
//! - **Scene graph**: single-rooted tree of owned nodes, meters, Y-up
//! - **Cancellation**: cooperative flag checked at major work units
//!
//! # Example
//!
//! ```ignore
//! use plinth_core::{load_asset, CancelFlag};
//!
//! let asset = load_asset("model.usdz".as_ref(), &CancelFlag::new())?;
//! println!(
//!     "loaded {} nodes, {} triangles",
//!     asset.root.node_count(),
//!     asset.root.triangle_count()
//! );
//! ```

pub mod builder;
pub mod error;
pub mod format;
pub mod formats;
pub mod loader;
pub mod material;
pub mod mesh;
pub mod scene;

// Re-export commonly used types
pub use error::{ErrorKind, LoadError, LoadResult};
pub use format::{AssetFormat, SUPPORTED_FORMATS};
pub use loader::{load_asset, CancelFlag};
pub use material::Material;
pub use mesh::{Mesh, Vertex};
pub use scene::{Asset, SceneNode, Transform};
