//! Command line argument parsing and validation.

use crate::release::settings::DEFAULT_CONFIG_FILE;
use clap::Parser;
use std::path::PathBuf;

/// Release packager for container images and Helm charts
#[derive(Parser, Debug)]
#[command(
    name = "release_pack",
    version,
    about = "Packages an application into a container image, a Helm chart and offline release archives",
    long_about = "Packages an application into a container image, a Helm chart and offline release archives.

Goals are declared per platform in the config file:
  [docker]      goals = [\"package\", \"push\", \"save\"]
  [helm_chart]  goals = [\"package\", \"push\", \"save\"]

Usage:
  release_pack
  release_pack --config deploy/release-pack.toml
  release_pack --home-dir /tmp/release --verbose

Exit code 0 = every requested archive was produced, 130 = interrupted."
)]
pub struct Args {
    /// Release configuration file
    #[arg(
        short,
        long,
        value_name = "PATH",
        env = "RELEASE_PACK_CONFIG",
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    /// Output directory, overrides `pack.home_dir`
    #[arg(long, value_name = "DIR")]
    pub home_dir: Option<PathBuf>,

    /// Erase the output directory before packaging
    #[arg(long)]
    pub clean: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default log filter when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.config.as_os_str().is_empty() {
            return Err("Config path cannot be empty".to_string());
        }
        if let Some(home) = &self.home_dir
            && home.as_os_str().is_empty()
        {
            return Err("Home directory cannot be empty".to_string());
        }
        Ok(())
    }
}
