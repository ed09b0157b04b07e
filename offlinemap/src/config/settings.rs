//! Configuration settings and their defaults.

use std::path::PathBuf;

use crate::store::ReplacePolicy;

pub use crate::export::DEFAULT_DENSIFICATION_FACTOR;
pub use crate::tiling::DEFAULT_MAX_EXPORT_TILES;

/// Default live vector tile service.
pub const DEFAULT_SERVICE_URL: &str =
    "https://basemaps.arcgis.com/arcgis/rest/services/World_Basemap_v2/VectorTileServer";

/// Default HTTP timeout in seconds.
pub const DEFAULT_SERVICE_TIMEOUT_SECS: u64 = 30;

/// Default concurrent tile requests.
pub const DEFAULT_SERVICE_PARALLEL: usize = 8;

/// Upper bound for concurrent tile requests.
pub const MAX_SERVICE_PARALLEL: usize = 64;

/// Default parameter request timeout in seconds.
pub const DEFAULT_PARAMETERS_TIMEOUT_SECS: u64 = 60;

/// Default export job timeout in seconds.
pub const DEFAULT_EXPORT_TIMEOUT_SECS: u64 = 1800;

/// Get the path to the config directory (~/.offlinemap).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".offlinemap")
}

/// Get the path to the config file (~/.offlinemap/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// Default offline cache directory (`<data dir>/offlinemap`).
pub fn default_cache_directory() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(config_directory)
        .join("offlinemap")
}

/// Default log file (~/.offlinemap/offlinemap.log).
pub fn default_log_file() -> PathBuf {
    config_directory().join("offlinemap.log")
}

/// Complete configuration file contents.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub cache: CacheSettings,
    pub export: ExportSettings,
    pub service: ServiceSettings,
    pub logging: LoggingSettings,
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Offline cache root.
    pub directory: PathBuf,
    /// How exports replace the existing cache.
    pub replace: ReplacePolicy,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: default_cache_directory(),
            replace: ReplacePolicy::default(),
        }
    }
}

/// `[export]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub densification_factor: f64,
    /// Seconds.
    pub parameters_timeout: u64,
    /// Seconds.
    pub export_timeout: u64,
    /// Hard cap on the exported level of detail.
    pub max_level: Option<u8>,
    /// Most tiles one export may request.
    pub max_tiles: u64,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            densification_factor: DEFAULT_DENSIFICATION_FACTOR,
            parameters_timeout: DEFAULT_PARAMETERS_TIMEOUT_SECS,
            export_timeout: DEFAULT_EXPORT_TIMEOUT_SECS,
            max_level: None,
            max_tiles: DEFAULT_MAX_EXPORT_TILES,
        }
    }
}

/// `[service]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub url: String,
    /// Seconds.
    pub timeout: u64,
    pub parallel: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVICE_URL.to_string(),
            timeout: DEFAULT_SERVICE_TIMEOUT_SECS,
            parallel: DEFAULT_SERVICE_PARALLEL,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}
