//! Format sniffing: decide which decoder handles a picked file.
//!
//! Detection order: case-insensitive file extension first; if the extension
//! is missing or unknown, peek at the first bytes for a known magic
//! signature. Support is a static capability table, never platform
//! type-identifier registration.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{LoadError, LoadResult};

/// Maximum number of header bytes the sniffer will read.
pub const SNIFF_LEN: usize = 64;

/// The asset formats this pipeline can decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetFormat {
    /// Zip-packaged OpenUSD scene container (`.usdz`)
    Usdz,
    /// Bare OpenUSD ASCII layer (`.usda` / `.usd`)
    Usda,
    /// glTF 2.0, JSON (`.gltf`) or binary (`.glb`)
    Gltf,
    /// Wavefront OBJ text geometry (`.obj`)
    Obj,
}

/// One row of the static capability table.
pub struct FormatCapability {
    pub format: AssetFormat,
    pub extensions: &'static [&'static str],
    pub description: &'static str,
}

/// Every format the pipeline supports, with its recognized extensions.
pub const SUPPORTED_FORMATS: &[FormatCapability] = &[
    FormatCapability {
        format: AssetFormat::Usdz,
        extensions: &["usdz"],
        description: "zip-packaged OpenUSD scene container",
    },
    FormatCapability {
        format: AssetFormat::Usda,
        extensions: &["usda", "usd"],
        description: "OpenUSD ASCII scene description",
    },
    FormatCapability {
        format: AssetFormat::Gltf,
        extensions: &["gltf", "glb"],
        description: "GL Transmission Format 2.0",
    },
    FormatCapability {
        format: AssetFormat::Obj,
        extensions: &["obj"],
        description: "Wavefront OBJ geometry",
    },
];

/// Map a file extension (without dot, any case) to a format.
pub fn format_for_extension(ext: &str) -> Option<AssetFormat> {
    let ext = ext.to_ascii_lowercase();
    SUPPORTED_FORMATS
        .iter()
        .find(|cap| cap.extensions.contains(&ext.as_str()))
        .map(|cap| cap.format)
}

/// Sniff a header for a known magic signature.
pub fn format_for_header(header: &[u8]) -> Option<AssetFormat> {
    // Zip local-file header: USDZ is the only zip container we accept
    if header.starts_with(b"PK\x03\x04") {
        return Some(AssetFormat::Usdz);
    }
    // GLB magic
    if header.starts_with(b"glTF") {
        return Some(AssetFormat::Gltf);
    }
    if header.starts_with(b"#usda") {
        return Some(AssetFormat::Usda);
    }

    let text = std::str::from_utf8(header).ok()?;
    let trimmed = text.trim_start();
    // A glTF JSON document opens with an object brace
    if trimmed.starts_with('{') {
        return Some(AssetFormat::Gltf);
    }
    // OBJ heuristic: a leading statement keyword on the first non-comment line
    for line in trimmed.lines() {
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        const OBJ_KEYWORDS: &[&str] = &["v ", "vn ", "vt ", "f ", "o ", "g ", "mtllib "];
        if OBJ_KEYWORDS.iter().any(|kw| line.starts_with(kw)) {
            return Some(AssetFormat::Obj);
        }
        break;
    }
    None
}

/// Determine the format of a file on disk.
///
/// Checks the extension first, then falls back to reading at most
/// [`SNIFF_LEN`] header bytes. Fails with `UnsupportedFormat` when neither
/// yields a known format.
pub fn detect(path: &Path) -> LoadResult<AssetFormat> {
    if let Some(format) = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(format_for_extension)
    {
        return Ok(format);
    }

    let mut header = [0u8; SNIFF_LEN];
    let mut file = File::open(path)?;
    let read = file.read(&mut header)?;

    format_for_header(&header[..read]).ok_or_else(|| {
        LoadError::UnsupportedFormat(path.to_string_lossy().into_owned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_detection_is_case_insensitive() {
        assert_eq!(format_for_extension("OBJ"), Some(AssetFormat::Obj));
        assert_eq!(format_for_extension("UsDz"), Some(AssetFormat::Usdz));
        assert_eq!(format_for_extension("glb"), Some(AssetFormat::Gltf));
        assert_eq!(format_for_extension("usd"), Some(AssetFormat::Usda));
        assert_eq!(format_for_extension("fbx"), None);
    }

    #[test]
    fn test_header_magic() {
        assert_eq!(
            format_for_header(b"PK\x03\x04rest-of-zip"),
            Some(AssetFormat::Usdz)
        );
        assert_eq!(
            format_for_header(b"glTF\x02\x00\x00\x00"),
            Some(AssetFormat::Gltf)
        );
        assert_eq!(
            format_for_header(b"#usda 1.0\n"),
            Some(AssetFormat::Usda)
        );
        assert_eq!(
            format_for_header(b"  {\"asset\":{\"version\":\"2.0\"}}"),
            Some(AssetFormat::Gltf)
        );
    }

    #[test]
    fn test_obj_heuristic_skips_comments() {
        let header = b"# exported by tool\nv 0.0 0.0 0.0\n";
        assert_eq!(format_for_header(header), Some(AssetFormat::Obj));
    }

    #[test]
    fn test_unknown_header() {
        assert_eq!(format_for_header(b"\x00\x01\x02\x03"), None);
        assert_eq!(format_for_header(b"hello world"), None);
    }

    #[test]
    fn test_detect_uppercase_obj_path() {
        // Extension wins without touching the filesystem
        let format = detect(Path::new("/nonexistent/model.OBJ")).unwrap();
        assert_eq!(format, AssetFormat::Obj);
    }

    #[test]
    fn test_capability_table_covers_all_formats() {
        for cap in SUPPORTED_FORMATS {
            assert!(!cap.extensions.is_empty());
            assert!(!cap.description.is_empty());
        }
    }
}
