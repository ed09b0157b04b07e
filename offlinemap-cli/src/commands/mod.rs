//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`basemap`] - Switch between live and offline basemaps
//! - [`cache`] - Offline cache status and removal
//! - [`config`] - Configuration management (get, set, list, path)
//! - [`export`] - Export an area into the offline cache
//! - [`track`] - Replay location samples

pub mod basemap;
pub mod cache;
pub mod common;
pub mod config;
pub mod export;
pub mod track;
