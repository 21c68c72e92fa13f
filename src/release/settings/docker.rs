//! Container image platform settings.

use super::RegistryUser;
use serde::Deserialize;
use std::path::PathBuf;

/// `[docker]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DockerSettings {
    /// Goals for the image platform.
    #[serde(default)]
    pub goals: Vec<String>,

    /// Build context directory.
    #[serde(default = "default_context")]
    pub context: PathBuf,

    /// Dockerfile, relative to the build context.
    #[serde(default = "default_dockerfile")]
    pub dockerfile: PathBuf,

    /// Image name. Defaults to the pack name.
    #[serde(default)]
    pub image_name: Option<String>,

    /// Registry host, e.g. `harbor.example.com`.
    #[serde(default)]
    pub registry: Option<String>,

    /// Repository (project) inside the registry.
    #[serde(default)]
    pub repo: Option<String>,

    /// Registry credentials, also the default for chart pushes.
    #[serde(default)]
    pub registry_user: Option<RegistryUser>,

    /// Extra files or directories copied into the image bundle.
    #[serde(default)]
    pub resources: Vec<PathBuf>,
}

fn default_context() -> PathBuf {
    PathBuf::from(".")
}

fn default_dockerfile() -> PathBuf {
    PathBuf::from("Dockerfile")
}

impl DockerSettings {
    /// Registry host and repository when both are set and non-blank.
    pub fn registry_repo(&self) -> Option<(&str, &str)> {
        let registry = self.registry.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let repo = self.repo.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((registry, repo))
    }

    /// Local image tag, `<image>:<version>`.
    pub fn local_tag(&self, pack_name: &str, version: &str) -> String {
        let name = self.image_name.as_deref().unwrap_or(pack_name);
        format!("{}:{}", name, version)
    }

    /// Registry tag, `<registry>/<repo>/<image>:<version>`.
    pub fn remote_tag(&self, pack_name: &str, version: &str) -> Option<String> {
        let (registry, repo) = self.registry_repo()?;
        Some(format!(
            "{}/{}/{}",
            registry,
            repo,
            self.local_tag(pack_name, version)
        ))
    }
}
