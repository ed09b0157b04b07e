//! Configuration file at `~/.offlinemap/config.ini`.
//!
//! ```ini
//! [cache]
//! directory = ~/.local/share/offlinemap
//! replace = staged
//!
//! [export]
//! densification_factor = 0.1
//! parameters_timeout = 60
//! export_timeout = 1800
//! max_level =
//!
//! [service]
//! url = https://basemaps.arcgis.com/arcgis/rest/services/World_Basemap_v2/VectorTileServer
//! timeout = 30
//! parallel = 8
//!
//! [logging]
//! file = ~/.offlinemap/offlinemap.log
//! ```

mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use file::ConfigFileError;
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{
    config_directory, config_file_path, default_cache_directory, default_log_file,
    CacheSettings, ConfigFile, ExportSettings, LoggingSettings, ServiceSettings,
    DEFAULT_DENSIFICATION_FACTOR, DEFAULT_EXPORT_TIMEOUT_SECS, DEFAULT_MAX_EXPORT_TILES, DEFAULT_PARAMETERS_TIMEOUT_SECS,
    DEFAULT_SERVICE_PARALLEL, DEFAULT_SERVICE_TIMEOUT_SECS, DEFAULT_SERVICE_URL,
    MAX_SERVICE_PARALLEL,
};
