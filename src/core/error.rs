//! Error types for the camera offload tool
//!
//! Fatal errors stop a run before any file is touched. Per-file failures are
//! not errors at this level: they are recorded as `FileOutcome::Failed` in the
//! batch report and the run carries on.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the camera offload tool
#[derive(Error, Debug)]
pub enum OffloadError {
    /// Source root does not exist or is not a directory
    #[error("Source directory does not exist: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Source root has no camera storage folder
    #[error("Source does not contain a {name} directory: {}", .source_root.display())]
    StorageDirNotFound { source_root: PathBuf, name: String },

    /// Could not read a file's timestamp from filesystem metadata
    #[error("Failed to read timestamp of '{}': {message}", .path.display())]
    Timestamp { path: PathBuf, message: String },

    /// Could not create a destination directory
    #[error("Failed to create directory '{}': {message}", .path.display())]
    DirectoryCreation { path: PathBuf, message: String },

    /// Copy failed (including the destination appearing mid-flight)
    #[error("Failed to copy to '{}': {message}", .destination.display())]
    Copy {
        destination: PathBuf,
        message: String,
    },

    /// General I/O error
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, OffloadError>;

impl From<std::io::Error> for OffloadError {
    fn from(err: std::io::Error) -> Self {
        OffloadError::Io(err.to_string())
    }
}
