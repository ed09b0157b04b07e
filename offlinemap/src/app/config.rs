//! Application configuration for OfflineMapApp.
//!
//! `AppConfig` combines what the controller needs to wire its components:
//! where the offline cache lives, how exports run, and how the tiling service
//! is reached.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ConfigFile;
use crate::export::ExportConfig;
use crate::tiling::{
    HttpTilingServiceFactory, DEFAULT_HTTP_TIMEOUT, DEFAULT_MAX_EXPORT_TILES, DEFAULT_PARALLEL_REQUESTS,
};

/// Application configuration combining all component configs.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// Application-data root holding the offline cache.
    pub cache_directory: PathBuf,

    /// Export coordinator settings.
    pub export: ExportConfig,

    /// Tiling service settings.
    pub service: ServiceAppConfig,
}

/// How the tiling service is reached.
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceAppConfig {
    /// HTTP request timeout.
    pub timeout: Duration,

    /// Concurrent tile fetches.
    pub parallel: usize,

    /// Hard cap on the exported level of detail.
    pub max_level: Option<u8>,

    /// Most tiles one export may request.
    pub max_tiles: u64,
}

impl Default for ServiceAppConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_HTTP_TIMEOUT,
            parallel: DEFAULT_PARALLEL_REQUESTS,
            max_level: None,
            max_tiles: DEFAULT_MAX_EXPORT_TILES,
        }
    }
}

impl AppConfig {
    /// Create a config with default export and service settings.
    pub fn new(cache_directory: impl Into<PathBuf>) -> Self {
        Self {
            cache_directory: cache_directory.into(),
            export: ExportConfig::default(),
            service: ServiceAppConfig::default(),
        }
    }

    /// Create application config from the configuration file.
    ///
    /// Keeps the translation from INI values to typed settings in one place
    /// rather than scattered in CLI code.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            cache_directory: config.cache.directory.clone(),
            export: ExportConfig::new()
                .with_densification_factor(config.export.densification_factor)
                .with_parameters_timeout(Duration::from_secs(config.export.parameters_timeout))
                .with_export_timeout(Duration::from_secs(config.export.export_timeout))
                .with_replace_policy(config.cache.replace),
            service: ServiceAppConfig {
                timeout: Duration::from_secs(config.service.timeout),
                parallel: config.service.parallel,
                max_level: config.export.max_level,
                max_tiles: config.export.max_tiles,
            },
        }
    }

    /// Set the export settings.
    pub fn with_export(mut self, export: ExportConfig) -> Self {
        self.export = export;
        self
    }

    /// Set the concurrent tile fetch count.
    pub fn with_parallel(mut self, parallel: usize) -> Self {
        self.service.parallel = parallel;
        self
    }

    /// Cap the exported level of detail.
    pub fn with_max_level(mut self, max_level: Option<u8>) -> Self {
        self.service.max_level = max_level;
        self
    }

    /// Cap how many tiles one export may request.
    pub fn with_max_tiles(mut self, max_tiles: u64) -> Self {
        self.service.max_tiles = max_tiles;
        self
    }

    /// Factory for HTTP tiling services using these settings.
    pub fn service_factory(&self) -> HttpTilingServiceFactory {
        HttpTilingServiceFactory::new(
            self.service.timeout,
            self.service.parallel,
            self.service.max_level,
        )
        .with_max_tiles(self.service.max_tiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ReplacePolicy;

    #[test]
    fn test_new_uses_defaults() {
        let config = AppConfig::new("/data/offlinemap");
        assert_eq!(config.cache_directory, PathBuf::from("/data/offlinemap"));
        assert_eq!(config.export, ExportConfig::default());
        assert_eq!(config.service.parallel, DEFAULT_PARALLEL_REQUESTS);
        assert_eq!(config.service.max_level, None);
    }

    #[test]
    fn test_from_config_file() {
        let mut file = ConfigFile::default();
        file.cache.directory = PathBuf::from("/srv/maps");
        file.cache.replace = ReplacePolicy::ClearFirst;
        file.export.densification_factor = 0.5;
        file.export.parameters_timeout = 5;
        file.export.export_timeout = 90;
        file.export.max_level = Some(14);
        file.service.timeout = 10;
        file.service.parallel = 4;
        file.export.max_tiles = 2_000;

        let config = AppConfig::from_config_file(&file);

        assert_eq!(config.cache_directory, PathBuf::from("/srv/maps"));
        assert_eq!(config.export.densification_factor, 0.5);
        assert_eq!(config.export.parameters_timeout, Duration::from_secs(5));
        assert_eq!(config.export.export_timeout, Duration::from_secs(90));
        assert_eq!(config.export.replace_policy, ReplacePolicy::ClearFirst);
        assert_eq!(config.service.timeout, Duration::from_secs(10));
        assert_eq!(config.service.parallel, 4);
        assert_eq!(config.service.max_level, Some(14));
        assert_eq!(config.service.max_tiles, 2_000);
    }

    #[test]
    fn test_default_file_matches_default_config() {
        let config = AppConfig::from_config_file(&ConfigFile::default());
        assert_eq!(config.export, ExportConfig::default());
        assert_eq!(config.service.max_tiles, DEFAULT_MAX_EXPORT_TILES);
    }

    #[test]
    fn test_builders() {
        let config = AppConfig::new("/tmp/x")
            .with_parallel(2)
            .with_max_level(Some(10))
            .with_max_tiles(50)
            .with_export(ExportConfig::new().with_densification_factor(1.0));

        assert_eq!(config.service.parallel, 2);
        assert_eq!(config.service.max_level, Some(10));
        assert_eq!(config.service.max_tiles, 50);
        assert_eq!(config.export.densification_factor, 1.0);
    }
}
