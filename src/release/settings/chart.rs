//! Helm chart platform settings.

use super::RegistryUser;
use serde::Deserialize;
use std::path::PathBuf;

/// Default file name of the exported images archive.
pub(crate) const DEFAULT_IMAGES_FILE: &str = "images.tar";

/// `[helm_chart]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HelmChartSettings {
    /// Chart source directory.
    pub location: PathBuf,

    /// Goals for the chart platform.
    #[serde(default)]
    pub goals: Vec<String>,

    /// File name for the packaged chart in the home directory.
    #[serde(default)]
    pub file_name: Option<String>,

    /// Chart repository upload URL.
    #[serde(default)]
    pub chart_repo_url: Option<String>,

    /// Push credentials. Falls back to `[docker.registry_user]`.
    #[serde(default)]
    pub registry_user: Option<RegistryUser>,

    /// Images exported into the release bundle.
    #[serde(default)]
    pub save_images: Vec<String>,

    /// File name of the exported images archive.
    #[serde(default)]
    pub save_image_file_name: Option<String>,

    /// Also export the image built by the docker platform.
    #[serde(default = "default_true")]
    pub include_built_image: bool,

    /// Extra files or directories copied into the chart bundle.
    #[serde(default)]
    pub resources: Vec<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl HelmChartSettings {
    /// Configured images with blank entries removed.
    pub fn static_images(&self) -> Vec<String> {
        self.save_images
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Images archive file name.
    pub fn images_file_name(&self) -> &str {
        self.save_image_file_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_IMAGES_FILE)
    }
}
