//! Error types for release packaging.
//!
//! Only fatal conditions travel through [`PackError`]. Skips and local step
//! failures are logged by the packagers and reported as step outcomes.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for release operations
pub type Result<T> = std::result::Result<T, PackError>;

/// Main error type for all release operations
#[derive(Error, Debug)]
pub enum PackError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config error in {path}: {source}")]
    Config {
        /// Config file path
        path: PathBuf,
        /// TOML parser error
        #[source]
        source: toml::de::Error,
    },

    /// File system operation failed on a specific path
    #[error("{context} {path}: {source}")]
    Fs {
        /// What was being done
        context: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// External command could not run or exited unsuccessfully
    #[error("Command `{command}` failed: {reason}")]
    Command {
        /// Program and subcommand
        command: String,
        /// Captured stderr or spawn error
        reason: String,
    },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Save step could not produce its release archive
    #[error("{message}")]
    Save {
        /// User-facing message
        message: String,
        /// Underlying cause
        #[source]
        source: Box<PackError>,
    },

    /// Generic error with message
    #[error("{0}")]
    GenericError(String),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Config file missing
    #[error("Config file not found: {path}")]
    ConfigNotFound {
        /// Path that was looked up
        path: PathBuf,
    },
}

impl PackError {
    /// Wraps an error as a fatal save-step failure.
    pub fn save(message: impl Into<String>, source: PackError) -> Self {
        PackError::Save {
            message: message.into(),
            source: Box::new(source),
        }
    }
}

/// Returns early with a [`PackError::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::error::PackError::GenericError(format!($($arg)*)))
    };
}

/// Attaches file system context to `std::io::Result`.
pub trait ErrorExt<T> {
    /// Maps an IO error into [`PackError::Fs`] naming the operation and path.
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| PackError::Fs {
            context,
            path: path.into(),
            source,
        })
    }
}
