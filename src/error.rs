//! Error types for abstract file operations
//!
//! Errors are plain descriptive values. The one distinction callers usually
//! care about is [`FileError::NotFound`], which is split out of the underlying
//! `io::Error` so it can be matched without inspecting error kinds.
//!
//! "Already exists" is deliberately not an error: operations that find their
//! target already in place report a soft `Ok(false)` (or `Ok(None)`) instead.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced by abstract file operations
#[derive(Error, Debug)]
pub enum FileError {
    /// Operation needs a value but the address has no underlying path
    #[error("Null path")]
    NullPath,

    /// The path does not exist
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The path exists but is not a regular file
    #[error("The path is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    /// The path exists but is not a directory
    #[error("The path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Any other platform IO failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path the failing call operated on
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Source and destination nest inside one another
    #[error("{} and {} overlap", source_path.display(), destination.display())]
    OverlappingPaths {
        /// Entry being copied or moved
        source_path: PathBuf,
        /// Requested destination
        destination: PathBuf,
    },

    /// Permission string that is not a valid octal mode
    #[error("Invalid permissions '{0}': expected an octal string such as \"755\"")]
    InvalidPermissions(String),

    /// Checksum algorithm name that is not supported
    #[error("Unsupported checksum algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Feature that the current platform's permission model cannot express
    #[error("{0} is not supported on this platform")]
    PlatformUnsupported(&'static str),

    /// Feature that has not been implemented
    #[error("{0} is not yet implemented")]
    NotImplemented(&'static str),

    /// A blocking helper task failed to complete
    #[error("Background task failed: {0}")]
    Task(String),
}

impl FileError {
    /// Wrap an `io::Error` raised while operating on `path`
    ///
    /// `NotFound` errors become [`FileError::NotFound`]; everything else keeps
    /// its source error.
    #[must_use]
    pub fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Whether this error means the path does not exist
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type alias for abstract file operations
pub type Result<T> = std::result::Result<T, FileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_split_out() {
        let err = FileError::io(
            Path::new("/missing"),
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Path not found: /missing");
    }

    #[test]
    fn test_other_io_errors_keep_source() {
        let err = FileError::io(
            Path::new("/locked"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(!err.is_not_found());
        assert!(matches!(err, FileError::Io { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }
}
