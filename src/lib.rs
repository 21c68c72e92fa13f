//! Release packaging library.
//!
//! This library packages an application build into distributable artifacts:
//! - Container images (build, tag, push, export)
//! - Helm charts (package, push to a chart repository)
//! - Offline release archives combining a chart with its images
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod error;
pub mod release;

// Re-export commonly used types
pub use error::{CliError, PackError, Result};
