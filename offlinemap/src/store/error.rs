//! Error types for the offline cache store.

use std::io;
use std::path::PathBuf;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Filesystem failures while preparing, replacing or clearing the cache.
///
/// A missing package or resource directory is never reported through this
/// type; absence is a normal state and surfaces as `None`.
#[derive(Debug)]
pub enum StoreError {
    /// Failed to remove a previous cache or staging directory.
    ClearFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory.
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// Failed to move a directory into place.
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    /// Failed to write a file.
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to read a file or directory.
    ReadFailed { path: PathBuf, source: io::Error },

    /// The cache root cannot host a sibling staging directory.
    InvalidRoot(PathBuf),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClearFailed { path, source } => {
                write!(f, "failed to clear {}: {}", path.display(), source)
            }
            Self::CreateDirFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::RenameFailed { from, to, source } => {
                write!(
                    f,
                    "failed to move {} to {}: {}",
                    from.display(),
                    to.display(),
                    source
                )
            }
            Self::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            Self::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::InvalidRoot(path) => {
                write!(f, "invalid offline cache root: {}", path.display())
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ClearFailed { source, .. } => Some(source),
            Self::CreateDirFailed { source, .. } => Some(source),
            Self::RenameFailed { source, .. } => Some(source),
            Self::WriteFailed { source, .. } => Some(source),
            Self::ReadFailed { source, .. } => Some(source),
            Self::InvalidRoot(_) => None,
        }
    }
}
