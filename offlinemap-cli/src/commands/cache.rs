//! Offline cache CLI commands.

use offlinemap::package::TilePackage;

use super::common::format_size;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Report what the offline cache holds.
pub fn run_status(debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug)?;
    runner.log_startup("status");
    let store = runner.store();

    println!("Offline cache: {}", store.root().display());

    match store.load_if_present() {
        None => println!("  Package:   (none)"),
        Some(handle) => {
            println!("  Package:   {}", handle.package_path().display());
            match TilePackage::open(handle.package_path()) {
                Ok(package) => {
                    let header = package.header();
                    println!("  Source:    {}", header.source);
                    println!("  Levels:    {}-{}", header.min_zoom, header.max_zoom);
                    println!("  Tiles:     {}", package.tile_count());
                    println!("  Digest:    {}", package.summary().digest);
                }
                Err(e) => println!("  Unreadable: {}", e),
            }
            match handle.resources_path() {
                Some(path) => println!("  Resources: {}", path.display()),
                None => println!("  Resources: (none)"),
            }
        }
    }

    let stats = store.stats()?;
    println!("  Files:     {}", stats.files);
    println!("  Size:      {}", format_size(stats.bytes));
    Ok(())
}

/// Remove the offline cache.
pub fn run_clear(debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug)?;
    runner.log_startup("clear");
    let store = runner.store();

    println!("Clearing offline cache at: {}", store.root().display());
    let result = store.clear()?;
    println!(
        "Deleted {} files, freed {}",
        result.files_deleted,
        format_size(result.bytes_freed)
    );
    Ok(())
}
