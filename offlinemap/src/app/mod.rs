//! Application controller.
//!
//! [`OfflineMapApp`] is the single owner of the workflow state: it holds the
//! basemap switcher, the track recorder and the offline cache store, and
//! starts exports of what its view is currently showing. All mode changes go
//! through it, and a shared single-flight guard keeps exports and offline
//! loads from overlapping.
//!
//! ```text
//!            view (extent, scale)
//!                    │
//!   OfflineMapApp ───┼──► ExportCoordinator ──► TilingService
//!        │           │            │
//!        │           │            ▼
//!        ├── BasemapSwitcher ◄── OfflineCacheStore
//!        │
//!        └── TrackRecorder ──► view (track geometry, auto-pan)
//! ```

mod config;
mod controller;
mod error;

pub use config::{AppConfig, ServiceAppConfig};
pub use controller::OfflineMapApp;
pub use error::AppError;
