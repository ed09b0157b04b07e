//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use offlinemap::app::AppError;
use offlinemap::config::ConfigFileError;
use offlinemap::export::ExportError;
use offlinemap::store::StoreError;
use offlinemap::tiling::ServiceError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to read or write the config file
    ConfigFile(ConfigFileError),
    /// Failed to create the async runtime
    Runtime(std::io::Error),
    /// Workflow error from the library
    App(AppError),
    /// Offline cache store error
    Store(StoreError),
    /// Failed to read an input file
    Input { path: PathBuf, reason: String },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::App(AppError::Export(ExportError::Busy(_))) => {
                eprintln!();
                eprintln!("Another export or offline load is using the cache.");
                eprintln!("Wait for it to finish and try again.");
            }
            CliError::App(AppError::Export(ExportError::Service(ServiceError::Http {
                ..
            }))) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. No network connection");
                eprintln!("  2. Wrong service URL: check with 'offlinemap config get service.url'");
                eprintln!("  3. Slow server: raise 'service.timeout'");
            }
            CliError::App(AppError::Export(e)) => {
                if let Some(detail) = e.detail() {
                    eprintln!("  {}", detail);
                }
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::App(e) => write!(f, "{}", e),
            CliError::Store(e) => write!(f, "Offline cache error: {}", e),
            CliError::Input { path, reason } => {
                write!(f, "Failed to read '{}': {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::App(e) => Some(e),
            CliError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}

impl From<ExportError> for CliError {
    fn from(e: ExportError) -> Self {
        CliError::App(AppError::Export(e))
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}
