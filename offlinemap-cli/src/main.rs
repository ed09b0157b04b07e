//! OfflineMap CLI - Command-line interface
//!
//! This binary exposes the offline map workflow from a terminal: export the
//! vector tiles of an area, inspect or clear the offline cache, switch
//! basemaps, and replay location tracks.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use offlinemap::region::Extent;

use commands::common::parse_extent;
use commands::config::ConfigCommands;

#[derive(Parser)]
#[command(name = "offlinemap")]
#[command(version, about = "Export vector tiles for offline use", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export an area into the offline cache
    Export {
        /// Visible area as XMIN,YMIN,XMAX,YMAX in degrees
        #[arg(long, value_parser = parse_extent, allow_hyphen_values = true)]
        bbox: Extent,

        /// Map scale denominator the area is viewed at (e.g. 50000)
        #[arg(long)]
        scale: f64,

        /// Vector tile service URL (defaults to service.url from config)
        #[arg(long)]
        url: Option<String>,

        /// Concurrent tile requests (defaults to service.parallel from config)
        #[arg(long)]
        parallel: Option<usize>,

        /// Deepest level of detail to export
        #[arg(long)]
        max_level: Option<u8>,
    },

    /// Show what the offline cache holds
    Status,

    /// Remove the offline cache
    Clear,

    /// Switch the basemap and report what would be drawn
    Basemap {
        /// Build the basemap from the offline cache
        #[arg(long, conflicts_with = "online", required_unless_present = "online")]
        offline: bool,

        /// Use the live basemap
        #[arg(long)]
        online: bool,
    },

    /// Replay location samples through the track recorder
    Track {
        /// File of `lat,lon` lines; `#off` and `#on` toggle tracking
        #[arg(long)]
        input: PathBuf,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Export {
            bbox,
            scale,
            url,
            parallel,
            max_level,
        } => commands::export::run(
            commands::export::ExportArgs {
                bbox,
                scale,
                url,
                parallel,
                max_level,
            },
            cli.debug,
        ),
        Commands::Status => commands::cache::run_status(cli.debug),
        Commands::Clear => commands::cache::run_clear(cli.debug),
        Commands::Basemap { offline, online } => {
            commands::basemap::run(offline && !online, cli.debug)
        }
        Commands::Track { input } => commands::track::run(&input, cli.debug),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
