//! Top-level load pipeline: sniff, decode, build.
//!
//! [`load_asset`] is the single entry point the session layer runs on a
//! worker thread. It never touches UI state; cancellation is cooperative
//! through a shared [`CancelFlag`] that decoders check at each major work
//! unit (per mesh, per archive entry).

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::builder;
use crate::error::{LoadError, LoadResult};
use crate::format::{self, AssetFormat};
use crate::formats;
use crate::scene::Asset;

/// Cooperative cancellation flag shared between the session and a running
/// decode. Cloning shares the underlying flag.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The running decode aborts at its next checkpoint.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Error-returning checkpoint for decoders.
    pub fn check(&self) -> LoadResult<()> {
        if self.is_cancelled() {
            Err(LoadError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Load a 3D asset file into a normalized, placeable [`Asset`].
///
/// Detects the format (extension first, then header magic), runs the
/// format-specific decoder, and normalizes the result to meters / Y-up under
/// a single root named after the file stem.
pub fn load_asset(path: &Path, cancel: &CancelFlag) -> LoadResult<Asset> {
    cancel.check()?;

    let format = format::detect(path)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("asset");

    log::info!("loading {:?} as {:?}", path, format);

    let source = match format {
        AssetFormat::Obj => formats::obj::decode(path, cancel)?,
        AssetFormat::Gltf => formats::gltf::decode(path, cancel)?,
        AssetFormat::Usdz => formats::usd::decode_usdz(path, cancel)?,
        AssetFormat::Usda => formats::usd::decode_usda(path, cancel)?,
    };

    cancel.check()?;
    Ok(builder::build(source, name))
}
