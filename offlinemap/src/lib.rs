//! OfflineMap - Offline vector tile basemaps with location tracking
//!
//! This library exports the vector tiles under a map view into a local cache,
//! switches the map between its live basemap and that cache, and records the
//! device's path while tracking is on.
//!
//! - [`export`] runs one export at a time against a [`tiling::TilingService`]
//!   and reports progress through an event stream.
//! - [`store`] owns the on-disk cache and replaces it atomically.
//! - [`basemap`] switches between the live and offline basemaps.
//! - [`track`] accumulates location samples into a drawable path.
//! - [`app`] wires these together around a [`view::MapViewSurface`].

pub mod app;
pub mod basemap;
pub mod config;
pub mod coord;
pub mod export;
pub mod guard;
pub mod logging;
pub mod package;
pub mod region;
pub mod store;
pub mod tiling;
pub mod track;
pub mod view;

/// Crate version, as published in Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_not_empty() {
        assert!(!VERSION.is_empty());
    }
}
