//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module is the single place where INI key names are mapped to struct
//! fields. The value parsers are shared with [`super::keys`].

use std::path::PathBuf;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::{ConfigFile, MAX_SERVICE_PARALLEL};
use crate::coord::MAX_ZOOM;
use crate::store::ReplacePolicy;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.cache.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("replace") {
            config.cache.replace = parse_replace(v).map_err(invalid("cache", "replace", v))?;
        }
    }

    // [export] section
    if let Some(section) = ini.section(Some("export")) {
        if let Some(v) = section.get("densification_factor") {
            config.export.densification_factor = parse_densification_factor(v)
                .map_err(invalid("export", "densification_factor", v))?;
        }
        if let Some(v) = section.get("parameters_timeout") {
            config.export.parameters_timeout =
                parse_seconds(v).map_err(invalid("export", "parameters_timeout", v))?;
        }
        if let Some(v) = section.get("export_timeout") {
            config.export.export_timeout =
                parse_seconds(v).map_err(invalid("export", "export_timeout", v))?;
        }
        if let Some(v) = section.get("max_level") {
            config.export.max_level =
                parse_max_level(v).map_err(invalid("export", "max_level", v))?;
        }
        if let Some(v) = section.get("max_tiles") {
            config.export.max_tiles =
                parse_max_tiles(v).map_err(invalid("export", "max_tiles", v))?;
        }
    }

    // [service] section
    if let Some(section) = ini.section(Some("service")) {
        if let Some(v) = section.get("url") {
            config.service.url = parse_url(v).map_err(invalid("service", "url", v))?;
        }
        if let Some(v) = section.get("timeout") {
            config.service.timeout = parse_seconds(v).map_err(invalid("service", "timeout", v))?;
        }
        if let Some(v) = section.get("parallel") {
            config.service.parallel =
                parse_parallel(v).map_err(invalid("service", "parallel", v))?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid<'a>(
    section: &'a str,
    key: &'a str,
    value: &'a str,
) -> impl FnOnce(String) -> ConfigFileError + 'a {
    move |reason| ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason,
    }
}

pub(super) fn parse_replace(value: &str) -> Result<ReplacePolicy, String> {
    value.parse()
}

pub(super) fn parse_densification_factor(value: &str) -> Result<f64, String> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err("must be a positive number, e.g. 0.1".to_string()),
    }
}

pub(super) fn parse_seconds(value: &str) -> Result<u64, String> {
    match value.trim().parse::<u64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err("must be a positive number of seconds".to_string()),
    }
}

pub(super) fn parse_parallel(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(v) if (1..=MAX_SERVICE_PARALLEL).contains(&v) => Ok(v),
        _ => Err(format!("must be between 1 and {}", MAX_SERVICE_PARALLEL)),
    }
}

/// Empty means no cap.
pub(super) fn parse_max_level(value: &str) -> Result<Option<u8>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse::<u8>() {
        Ok(v) if v <= MAX_ZOOM => Ok(Some(v)),
        _ => Err(format!("must be a level between 0 and {}, or empty", MAX_ZOOM)),
    }
}

pub(super) fn parse_max_tiles(value: &str) -> Result<u64, String> {
    match value.trim().replace('_', "").parse::<u64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err("must be a positive number of tiles".to_string()),
    }
}

pub(super) fn parse_url(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err("must be an http:// or https:// URL".to_string())
    }
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
