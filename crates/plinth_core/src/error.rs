//! Error taxonomy for the loading pipeline.
//!
//! Every failure is scoped to a single load attempt; nothing here is fatal
//! to the process. The sniffer and decoders return [`LoadError`], the scene
//! graph builder propagates decoder errors unchanged, and the session layer
//! surfaces [`ErrorKind`] to the UI collaborator.

use thiserror::Error;

/// Errors that can occur while sniffing, decoding, or building an asset.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The file is not one of the supported formats.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The file claims a supported format but its contents are structurally invalid.
    #[error("malformed file: {0}")]
    Malformed(String),

    /// The file is valid but uses a construct this pipeline does not implement.
    #[error("unsupported feature: {0}")]
    Unsupported(String),

    /// Reading the file (or an archive entry) failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The load was superseded or cancelled by the user.
    #[error("load cancelled")]
    Cancelled,
}

impl LoadError {
    /// Build a `Malformed` error from anything displayable.
    pub fn malformed(msg: impl Into<String>) -> Self {
        LoadError::Malformed(msg.into())
    }

    /// The coarse kind of this error, for display at the UI boundary.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            LoadError::Malformed(_) => ErrorKind::MalformedFile,
            LoadError::Unsupported(_) => ErrorKind::UnsupportedFeature,
            LoadError::Io(_) => ErrorKind::Io,
            LoadError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Coarse error classification surfaced to the UI collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedFormat,
    MalformedFile,
    UnsupportedFeature,
    Io,
    Cancelled,
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            LoadError::UnsupportedFormat("xyz".into()).kind(),
            ErrorKind::UnsupportedFormat
        );
        assert_eq!(
            LoadError::malformed("truncated").kind(),
            ErrorKind::MalformedFile
        );
        assert_eq!(
            LoadError::Unsupported("skinning".into()).kind(),
            ErrorKind::UnsupportedFeature
        );
        assert_eq!(LoadError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let err: LoadError = io.into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
