//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let max_level = config
        .export
        .max_level
        .map(|l| l.to_string())
        .unwrap_or_default();

    format!(
        r#"[cache]
; Offline cache directory (tile package and item resources)
directory = {}
; How a new export replaces the cache:
;   staged      - write to a staging directory, swap in on success (default)
;   clear_first - delete the cache before writing
replace = {}

[export]
; Multiplier applied to the map scale to choose the deepest level of detail.
; 0.1 exports tiles ten times more detailed than the current view.
densification_factor = {}
; Time limit in seconds for fetching export parameters
parameters_timeout = {}
; Time limit in seconds for the export job
export_timeout = {}
; Optional cap on the deepest level of detail (0-22, empty for none)
max_level = {}
; Most tiles one export may request; exports are made coarser to fit
max_tiles = {}

[service]
; Vector tile service of the live basemap
url = {}
; HTTP request timeout in seconds
timeout = {}
; Concurrent tile requests (1-64)
parallel = {}

[logging]
; Log file location
file = {}
"#,
        path_to_string(&config.cache.directory),
        config.cache.replace,
        config.export.densification_factor,
        config.export.parameters_timeout,
        config.export.export_timeout,
        max_level,
        config.export.max_tiles,
        config.service.url,
        config.service.timeout,
        config.service.parallel,
        path_to_string(&config.logging.file),
    )
}

pub(super) fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
