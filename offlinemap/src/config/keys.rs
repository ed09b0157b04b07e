//! Configuration key access and validation.
//!
//! Type-safe get/set of configuration values by `section.key` name, used by
//! the `config` CLI commands.

use std::str::FromStr;

use thiserror::Error;

use super::parser::{
    expand_tilde, parse_densification_factor, parse_max_level, parse_max_tiles, parse_parallel, parse_replace,
    parse_seconds, parse_url,
};
use super::settings::ConfigFile;
use super::writer::path_to_string;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    CacheDirectory,
    CacheReplace,

    ExportDensificationFactor,
    ExportParametersTimeout,
    ExportTimeout,
    ExportMaxLevel,
    ExportMaxTiles,

    ServiceUrl,
    ServiceTimeout,
    ServiceParallel,

    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|key| key.name() == s.to_lowercase())
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Every key, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::CacheDirectory,
            ConfigKey::CacheReplace,
            ConfigKey::ExportDensificationFactor,
            ConfigKey::ExportParametersTimeout,
            ConfigKey::ExportTimeout,
            ConfigKey::ExportMaxLevel,
            ConfigKey::ExportMaxTiles,
            ConfigKey::ServiceUrl,
            ConfigKey::ServiceTimeout,
            ConfigKey::ServiceParallel,
            ConfigKey::LoggingFile,
        ]
    }

    /// Get the canonical key name (e.g., "service.url").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::CacheDirectory => "cache.directory",
            ConfigKey::CacheReplace => "cache.replace",
            ConfigKey::ExportDensificationFactor => "export.densification_factor",
            ConfigKey::ExportParametersTimeout => "export.parameters_timeout",
            ConfigKey::ExportTimeout => "export.export_timeout",
            ConfigKey::ExportMaxLevel => "export.max_level",
            ConfigKey::ExportMaxTiles => "export.max_tiles",
            ConfigKey::ServiceUrl => "service.url",
            ConfigKey::ServiceTimeout => "service.timeout",
            ConfigKey::ServiceParallel => "service.parallel",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::CacheDirectory => path_to_string(&config.cache.directory),
            ConfigKey::CacheReplace => config.cache.replace.to_string(),
            ConfigKey::ExportDensificationFactor => config.export.densification_factor.to_string(),
            ConfigKey::ExportParametersTimeout => config.export.parameters_timeout.to_string(),
            ConfigKey::ExportTimeout => config.export.export_timeout.to_string(),
            ConfigKey::ExportMaxLevel => config
                .export
                .max_level
                .map(|l| l.to_string())
                .unwrap_or_default(),
            ConfigKey::ExportMaxTiles => config.export.max_tiles.to_string(),
            ConfigKey::ServiceUrl => config.service.url.clone(),
            ConfigKey::ServiceTimeout => config.service.timeout.to_string(),
            ConfigKey::ServiceParallel => config.service.parallel.to_string(),
            ConfigKey::LoggingFile => path_to_string(&config.logging.file),
        }
    }

    /// Set the value in a config file after validating it.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        let failed = |reason: String| ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason,
        };

        match self {
            ConfigKey::CacheDirectory => {
                config.cache.directory = non_empty_path(value).map_err(failed)?;
            }
            ConfigKey::CacheReplace => {
                config.cache.replace = parse_replace(value).map_err(failed)?;
            }
            ConfigKey::ExportDensificationFactor => {
                config.export.densification_factor =
                    parse_densification_factor(value).map_err(failed)?;
            }
            ConfigKey::ExportParametersTimeout => {
                config.export.parameters_timeout = parse_seconds(value).map_err(failed)?;
            }
            ConfigKey::ExportTimeout => {
                config.export.export_timeout = parse_seconds(value).map_err(failed)?;
            }
            ConfigKey::ExportMaxLevel => {
                config.export.max_level = parse_max_level(value).map_err(failed)?;
            }
            ConfigKey::ExportMaxTiles => {
                config.export.max_tiles = parse_max_tiles(value).map_err(failed)?;
            }
            ConfigKey::ServiceUrl => {
                config.service.url = parse_url(value).map_err(failed)?;
            }
            ConfigKey::ServiceTimeout => {
                config.service.timeout = parse_seconds(value).map_err(failed)?;
            }
            ConfigKey::ServiceParallel => {
                config.service.parallel = parse_parallel(value).map_err(failed)?;
            }
            ConfigKey::LoggingFile => {
                config.logging.file = non_empty_path(value).map_err(failed)?;
            }
        }
        Ok(())
    }
}

fn non_empty_path(value: &str) -> Result<std::path::PathBuf, String> {
    let value = value.trim();
    if value.is_empty() {
        Err("path cannot be empty".to_string())
    } else {
        Ok(expand_tilde(value))
    }
}
