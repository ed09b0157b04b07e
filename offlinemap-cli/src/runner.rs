//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization, and runtime creation
//! to reduce duplication across command handlers.

use tokio::runtime::Runtime;
use tracing::info;

use offlinemap::app::AppConfig;
use offlinemap::config::ConfigFile;
use offlinemap::logging::{init_logging, split_log_path, LoggingGuard};
use offlinemap::store::OfflineCacheStore;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// Log lines are mirrored to stdout only when stdout is not a terminal,
    /// so progress bars stay readable interactively.
    pub fn new(debug: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let (log_dir, log_file) = split_log_path(&config.logging.file);
        let stdout_enabled = !atty::is(atty::Stream::Stdout);

        let logging_guard = init_logging(&log_dir, &log_file, stdout_enabled, debug)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Application settings derived from the configuration file.
    pub fn app_config(&self) -> AppConfig {
        AppConfig::from_config_file(&self.config)
    }

    /// The offline cache store named by the configuration.
    pub fn store(&self) -> OfflineCacheStore {
        OfflineCacheStore::new(self.config.cache.directory.clone())
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("OfflineMap v{}", offlinemap::VERSION);
        info!(
            cache = %self.config.cache.directory.display(),
            "OfflineMap CLI: {} command", command
        );
    }

    /// Create a multi-threaded runtime for async commands.
    pub fn runtime(&self) -> Result<Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)
    }
}
