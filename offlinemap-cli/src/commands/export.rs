//! Export command - download the tiles of an area into the offline cache.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use offlinemap::app::OfflineMapApp;
use offlinemap::export::{ExportError, ExportEvent, PROGRESS_COMPLETE};
use offlinemap::region::Extent;
use offlinemap::view::HeadlessView;

use super::common::{format_size, live_basemap};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the export command.
pub struct ExportArgs {
    pub bbox: Extent,
    pub scale: f64,
    pub url: Option<String>,
    pub parallel: Option<usize>,
    pub max_level: Option<u8>,
}

/// Run the export command.
pub fn run(args: ExportArgs, debug: bool) -> Result<(), CliError> {
    if !(args.scale.is_finite() && args.scale > 0.0) {
        return Err(CliError::Config(format!(
            "Scale must be a positive number, got {}",
            args.scale
        )));
    }

    let runner = CliRunner::new(debug)?;
    runner.log_startup("export");
    let config = runner.config();

    let url = args.url.unwrap_or_else(|| config.service.url.clone());
    let mut app_config = runner.app_config();
    if let Some(parallel) = args.parallel {
        app_config = app_config.with_parallel(parallel.max(1));
    }
    if args.max_level.is_some() {
        app_config = app_config.with_max_level(args.max_level);
    }

    println!("OfflineMap Export v{}", offlinemap::VERSION);
    println!("=======================");
    println!();
    println!("Service: {}", url);
    println!("Area:    {}", args.bbox);
    println!("Scale:   1:{}", args.scale);
    println!("Cache:   {}", app_config.cache_directory.display());
    println!();
    println!("Press Ctrl+C to cancel");
    println!();

    let factory = Arc::new(app_config.service_factory());
    let view = HeadlessView::new(args.bbox, args.scale);
    let mut app = OfflineMapApp::new(&app_config, live_basemap(&url), factory, view);

    let runtime = runner.runtime()?;
    let result = runtime.block_on(async {
        let mut handle = app.create_offline_area_from_extent()?;

        let token = handle.cancellation();
        ctrlc::set_handler(move || {
            println!();
            println!("Received interrupt, cancelling export...");
            token.cancel();
        })
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

        let bar = progress_bar();
        while let Some(event) = handle.next_event().await {
            app.observe(&event);
            match event {
                ExportEvent::Progress(p) => bar.set_position(u64::from(p)),
                ExportEvent::Succeeded(_) => bar.finish_with_message("done"),
                ExportEvent::Cancelled => bar.abandon_with_message("cancelled"),
                ExportEvent::TimedOut(stage) => {
                    bar.abandon_with_message(format!("timed out during {}", stage))
                }
                ExportEvent::Failed { message, .. } => bar.abandon_with_message(message),
            }
        }

        Ok::<_, CliError>(handle.result().await)
    })?;

    match result {
        Ok(report) => {
            info!(
                tiles = report.tile_count,
                bytes = report.payload_bytes,
                "Export complete"
            );
            println!();
            println!("Export complete");
            println!("  Package: {}", report.handle.package_path().display());
            println!("  Levels:  {}-{}", report.min_level, report.max_level);
            println!(
                "  Tiles:   {} ({})",
                report.tile_count,
                format_size(report.payload_bytes)
            );
            println!("  Style:   {}", if report.handle.has_resources() { "yes" } else { "no" });
            println!("  Time:    {:.1}s", report.elapsed.as_secs_f64());
            Ok(())
        }
        Err(ExportError::Cancelled) => {
            println!("Export cancelled at {}%", app.download_progress());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(u64::from(PROGRESS_COMPLETE));
    // Template is static; fall back to the default style if it is ever rejected
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
