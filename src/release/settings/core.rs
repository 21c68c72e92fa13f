//! Top-level settings and config file loading.

use super::{DockerSettings, HelmChartSettings};
use crate::error::{CliError, ErrorExt, PackError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file looked up when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "release-pack.toml";

const DEFAULT_HOME_DIR: &str = "target/release-pack";

/// Settings shared by every platform.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackSettings {
    /// Application name, used in archive and image names.
    pub name: String,

    /// Application version.
    pub version: String,

    /// Output directory for every platform.
    #[serde(default = "default_home_dir")]
    pub home_dir: PathBuf,

    /// Erase the home directory before packaging.
    #[serde(default)]
    pub clean: bool,
}

fn default_home_dir() -> PathBuf {
    PathBuf::from(DEFAULT_HOME_DIR)
}

/// Complete release configuration.
///
/// # Examples
///
/// ```
/// use release_pack::release::Settings;
///
/// let settings = Settings::from_toml_str(r#"
///     [pack]
///     name = "demo"
///     version = "1.0.0"
///
///     [helm_chart]
///     location = "deploy/chart"
///     goals = ["package"]
/// "#).unwrap();
///
/// assert!(settings.docker.is_none());
/// assert_eq!(settings.helm_chart.unwrap().goals, vec!["package"]);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Shared settings.
    pub pack: PackSettings,

    /// Container image platform.
    #[serde(default)]
    pub docker: Option<DockerSettings>,

    /// Helm chart platform.
    #[serde(default)]
    pub helm_chart: Option<HelmChartSettings>,
}

impl Settings {
    /// Parses settings from TOML text.
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Loads settings from a TOML file.
    ///
    /// Relative paths inside the file are resolved against the file's
    /// directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::ConfigNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let text = std::fs::read_to_string(path).fs_context("reading config", path)?;
        let mut settings = Self::from_toml_str(&text).map_err(|source| PackError::Config {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            settings.rebase(base);
        }
        Ok(settings)
    }

    /// Joins every relative path onto `base`.
    pub fn rebase(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        join(&mut self.pack.home_dir);
        if let Some(docker) = &mut self.docker {
            join(&mut docker.context);
            docker.resources.iter_mut().for_each(join);
        }
        if let Some(chart) = &mut self.helm_chart {
            join(&mut chart.location);
            chart.resources.iter_mut().for_each(join);
        }
    }

    /// Output directory shared by all platforms.
    pub fn home_dir(&self) -> &Path {
        &self.pack.home_dir
    }

    /// Release archive name for a platform subdirectory.
    pub fn archive_name(&self, platform_dir: &str) -> String {
        format!(
            "{}-{}-{}.tar.gz",
            self.pack.name, self.pack.version, platform_dir
        )
    }
}
