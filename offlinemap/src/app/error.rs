//! Application error types.

use std::fmt;

use crate::basemap::BasemapError;
use crate::export::ExportError;
use crate::tiling::ServiceError;

/// Errors surfaced by the application controller.
#[derive(Debug)]
pub enum AppError {
    /// Starting or running an export failed.
    Export(ExportError),

    /// Switching the basemap failed.
    Basemap(BasemapError),

    /// Failed to create the tiling service.
    ServiceCreation(ServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Export(e) => write!(f, "Export failed: {}", e),
            AppError::Basemap(e) => write!(f, "Basemap switch failed: {}", e),
            AppError::ServiceCreation(e) => {
                write!(f, "Failed to create tiling service: {}", e)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Export(e) => Some(e),
            AppError::Basemap(e) => Some(e),
            AppError::ServiceCreation(e) => Some(e),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        AppError::Export(e)
    }
}

impl From<BasemapError> for AppError {
    fn from(e: BasemapError) -> Self {
        AppError::Basemap(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        AppError::ServiceCreation(e)
    }
}
