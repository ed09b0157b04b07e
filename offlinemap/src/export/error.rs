//! Export error types.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::guard::{CacheBusy, CacheState};
use crate::package::PackageError;
use crate::store::StoreError;
use crate::tiling::ServiceError;

/// Which step of an export was running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    /// Fetching default export parameters from the service.
    Parameters,
    /// Running the export job.
    Export,
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportStage::Parameters => write!(f, "parameter request"),
            ExportStage::Export => write!(f, "export job"),
        }
    }
}

/// Errors that end an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Another operation holds the offline cache.
    #[error("offline cache is busy ({0})")]
    Busy(CacheState),

    /// The cache directory could not be prepared or replaced.
    #[error("filesystem error: {0}")]
    Store(#[from] StoreError),

    /// The tiling service failed.
    #[error("{0}")]
    Service(#[from] ServiceError),

    /// The exported package did not validate.
    #[error("exported package is invalid: {0}")]
    Package(#[from] PackageError),

    /// A stage exceeded its time limit.
    #[error("{stage} timed out after {}s", .after.as_secs())]
    TimedOut { stage: ExportStage, after: Duration },

    /// The job was cancelled.
    #[error("export cancelled")]
    Cancelled,

    /// The live basemap has nothing that can be exported.
    #[error("basemap has no vector tile layer to export")]
    NoVectorTileLayer,

    /// The job task ended without delivering a result.
    #[error("export task ended without a result")]
    Aborted,
}

impl From<CacheBusy> for ExportError {
    fn from(busy: CacheBusy) -> Self {
        ExportError::Busy(busy.held_by)
    }
}

impl ExportError {
    /// Short message for display.
    pub fn message(&self) -> String {
        match self {
            ExportError::Service(e) => e.message(),
            ExportError::Store(_) => "Failed to prepare offline cache".to_string(),
            ExportError::Package(_) => "Exported package is invalid".to_string(),
            other => other.to_string(),
        }
    }

    /// Additional detail, when available.
    pub fn detail(&self) -> Option<String> {
        match self {
            ExportError::Service(e) => e.detail(),
            ExportError::Store(e) => Some(e.to_string()),
            ExportError::Package(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_service_error_passes_message_and_detail_through() {
        let err = ExportError::from(ServiceError::job("Export failed", "quota exceeded"));
        assert_eq!(err.message(), "Export failed");
        assert_eq!(err.detail(), Some("quota exceeded".to_string()));
    }

    #[test]
    fn test_store_error_detail() {
        let err = ExportError::from(StoreError::InvalidRoot(PathBuf::from("/")));
        assert_eq!(err.message(), "Failed to prepare offline cache");
        assert!(err.detail().is_some());
    }

    #[test]
    fn test_timed_out_display() {
        let err = ExportError::TimedOut {
            stage: ExportStage::Parameters,
            after: Duration::from_secs(60),
        };
        assert_eq!(err.to_string(), "parameter request timed out after 60s");
        assert_eq!(err.detail(), None);
    }

    #[test]
    fn test_busy_from_guard() {
        let err = ExportError::from(CacheBusy {
            held_by: CacheState::Loading,
        });
        assert!(matches!(err, ExportError::Busy(CacheState::Loading)));
        assert_eq!(err.to_string(), "offline cache is busy (loading)");
    }
}
