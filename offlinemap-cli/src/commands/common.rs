//! Common types and utilities shared across CLI commands.

use offlinemap::basemap::LiveBasemap;
use offlinemap::region::Extent;

/// Name given to the live basemap built from the configured service.
pub const LIVE_BASEMAP_NAME: &str = "live";

/// Parse a `XMIN,YMIN,XMAX,YMAX` argument.
pub fn parse_extent(s: &str) -> Result<Extent, String> {
    Extent::parse_bbox(s).map_err(|e| e.to_string())
}

/// Live basemap with a single vector tile layer at `url`.
pub fn live_basemap(url: &str) -> LiveBasemap {
    LiveBasemap::vector(LIVE_BASEMAP_NAME, url)
}

/// Format a byte count for display.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
