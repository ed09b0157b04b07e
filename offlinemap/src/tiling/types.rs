//! Tiling service types and traits

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use crate::package::PackageSummary;
use crate::region::NormalizedRegion;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Progress callback for export jobs.
///
/// Called with a percentage in `[0, 100]`. Services may report the same or
/// even a lower value more than once; the export coordinator filters these.
pub type ExportProgressCallback = Box<dyn Fn(u8) + Send + Sync>;

/// Errors reported by a tiling service.
///
/// Every variant renders to a short message plus optional detail, matching
/// how job errors are surfaced to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// HTTP request failed
    Http { url: String, reason: String },
    /// The requested resource does not exist
    NotFound(String),
    /// The service answered with something unusable
    InvalidResponse { url: String, reason: String },
    /// The service does not allow the requested operation
    Unsupported(String),
    /// The export job itself failed
    Job {
        message: String,
        detail: Option<String>,
    },
}

impl ServiceError {
    /// Creates a job failure with detail.
    pub fn job(message: impl Into<String>, detail: impl Into<String>) -> Self {
        ServiceError::Job {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    /// Short human-readable message.
    pub fn message(&self) -> String {
        match self {
            ServiceError::Http { .. } => "Request to tiling service failed".to_string(),
            ServiceError::NotFound(_) => "Resource not found".to_string(),
            ServiceError::InvalidResponse { .. } => {
                "Invalid response from tiling service".to_string()
            }
            ServiceError::Unsupported(msg) => msg.clone(),
            ServiceError::Job { message, .. } => message.clone(),
        }
    }

    /// Additional detail, when available.
    pub fn detail(&self) -> Option<String> {
        match self {
            ServiceError::Http { url, reason } => Some(format!("{}: {}", url, reason)),
            ServiceError::NotFound(url) => Some(url.clone()),
            ServiceError::InvalidResponse { url, reason } => Some(format!("{}: {}", url, reason)),
            ServiceError::Unsupported(_) => None,
            ServiceError::Job { detail, .. } => detail.clone(),
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{} ({})", self.message(), detail),
            None => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Parameters for one export, as suggested by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportParameters {
    /// Area to export.
    pub region: NormalizedRegion,
    /// Shallowest level of detail to include.
    pub min_level: u8,
    /// Deepest level of detail to include.
    pub max_level: u8,
    /// Number of tiles the export will request.
    pub estimated_tiles: u64,
}

/// Where an export writes its artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDestination {
    /// Tile package file to create.
    pub package_path: PathBuf,
    /// Directory for supplementary resources, created only if the service
    /// provides any.
    pub resources_path: PathBuf,
}

/// What a successful export produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifacts {
    /// Summary of the written package.
    pub package: PackageSummary,
    /// Whether a resource bundle was written.
    pub has_resources: bool,
}

/// A remote (or simulated) service that can export vector tiles.
///
/// Implementations must be `Send + Sync` so one instance can be shared by the
/// export coordinator across jobs. Methods return boxed futures so the trait
/// can be used as `Arc<dyn TilingService>`.
pub trait TilingService: Send + Sync {
    /// Identifies the tile source, e.g. its URL.
    fn source(&self) -> &str;

    /// Suggests export parameters for `region`, including tiles down to
    /// `max_scale`.
    fn default_export_parameters<'a>(
        &'a self,
        region: &'a NormalizedRegion,
        max_scale: f64,
    ) -> BoxFuture<'a, Result<ExportParameters, ServiceError>>;

    /// Runs an export, writing the package (and resources, if any) to
    /// `destination` and reporting progress as it goes.
    fn export<'a>(
        &'a self,
        parameters: &'a ExportParameters,
        destination: &'a ExportDestination,
        on_progress: ExportProgressCallback,
    ) -> BoxFuture<'a, Result<ExportArtifacts, ServiceError>>;
}

/// Creates a tiling service for a basemap layer URL.
pub trait TilingServiceFactory: Send + Sync {
    fn service_for(&self, url: &str) -> Result<Arc<dyn TilingService>, ServiceError>;
}

impl<F> TilingServiceFactory for F
where
    F: Fn(&str) -> Result<Arc<dyn TilingService>, ServiceError> + Send + Sync,
{
    fn service_for(&self, url: &str) -> Result<Arc<dyn TilingService>, ServiceError> {
        self(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_error_message_and_detail() {
        let err = ServiceError::job("Export failed", "disk full");
        assert_eq!(err.message(), "Export failed");
        assert_eq!(err.detail(), Some("disk full".to_string()));
        assert_eq!(err.to_string(), "Export failed (disk full)");
    }

    #[test]
    fn test_unsupported_has_no_detail() {
        let err = ServiceError::Unsupported("Export is disabled on this service".to_string());
        assert_eq!(err.detail(), None);
        assert_eq!(err.to_string(), "Export is disabled on this service");
    }

    #[test]
    fn test_http_error_detail_names_url() {
        let err = ServiceError::Http {
            url: "https://tiles.example.com".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.detail().unwrap().contains("tiles.example.com"));
    }
}
