//! Basemap command - switch between the live basemap and the offline cache.

use offlinemap::basemap::{ActiveBasemap, BasemapSwitcher};
use offlinemap::guard::CacheGuard;

use super::common::live_basemap;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the basemap command.
pub fn run(offline: bool, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug)?;
    runner.log_startup("basemap");

    let live = live_basemap(&runner.config().service.url);
    let mut switcher = BasemapSwitcher::new(live, runner.store(), CacheGuard::new());
    switcher
        .set_offline_mode(offline)
        .map_err(|e| CliError::App(e.into()))?;

    println!(
        "Mode:    {}",
        if switcher.is_offline() { "offline" } else { "online" }
    );
    println!("Basemap: {}", switcher.active_basemap());

    match switcher.active_basemap() {
        ActiveBasemap::Live(basemap) => {
            for layer in basemap.layers() {
                println!("  Layer: {}", layer.url());
            }
        }
        ActiveBasemap::Offline(session) => {
            let header = session.layer().tiles().header();
            println!("  Package: {}", session.handle().package_path().display());
            println!("  Source:  {}", header.source);
            println!("  Levels:  {}-{}", header.min_zoom, header.max_zoom);
            if let Some(style) = session.layer().resources().and_then(|r| r.style_path()) {
                println!("  Style:   {}", style.display());
            }
        }
        ActiveBasemap::Empty => {
            println!("  No offline cache found. Run 'offlinemap export' first.");
        }
    }

    Ok(())
}
