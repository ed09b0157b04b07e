//! Tiling services that export vector tiles for offline use.
//!
//! A [`TilingService`] does two things: suggest [`ExportParameters`] for a
//! region and target scale, and run an export that writes a tile package plus
//! optional style resources into an [`ExportDestination`].
//!
//! [`HttpTilingService`] implements this against a vector tile server over
//! HTTP. Tests and embedders can provide their own implementation; the trait
//! is dyn-compatible and shared as `Arc<dyn TilingService>`.

mod http;
mod types;
mod vector_tile_service;

pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_HTTP_TIMEOUT};
pub use types::{
    BoxFuture, ExportArtifacts, ExportDestination, ExportParameters, ExportProgressCallback,
    ServiceError, TilingService, TilingServiceFactory,
};
pub use vector_tile_service::{
    HttpTilingService, HttpTilingServiceFactory, DEFAULT_MAX_EXPORT_TILES, DEFAULT_PARALLEL_REQUESTS,
};
