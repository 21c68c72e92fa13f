//! Registry credentials and cross-platform fallbacks.
//!
//! The chart platform borrows the docker platform's registry user and
//! registry/repo pair when its own are not configured. Both fallbacks are
//! plain functions over the two settings sections.

use super::{DockerSettings, HelmChartSettings};
use serde::Deserialize;

const ENV_PREFIX: &str = "env:";

/// Registry username/password pair as written in configuration.
///
/// Each value is either a literal or an `env:NAME` reference.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryUser {
    /// Username or `env:NAME`.
    pub username: String,
    /// Password or `env:NAME`.
    pub password: String,
}

impl std::fmt::Debug for RegistryUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Credentials with every reference resolved.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedUser {
    /// Username
    pub username: String,
    /// Password
    pub password: String,
}

impl std::fmt::Debug for ResolvedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl RegistryUser {
    /// Creates a literal pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Resolves `env:` references.
    ///
    /// Returns `None` when a referenced variable is unset or either value
    /// ends up blank.
    pub fn resolve(&self) -> Option<ResolvedUser> {
        let username = resolve_value(&self.username)?;
        let password = resolve_value(&self.password)?;
        Some(ResolvedUser { username, password })
    }
}

fn resolve_value(raw: &str) -> Option<String> {
    let value = match raw.trim().strip_prefix(ENV_PREFIX) {
        Some(var) => match std::env::var(var.trim()) {
            Ok(value) => value,
            Err(_) => {
                log::debug!("Credential variable {} is not set", var.trim());
                return None;
            }
        },
        None => raw.to_string(),
    };
    (!value.trim().is_empty()).then_some(value)
}

/// Chart push endpoint.
///
/// Uses `chart_repo_url` when set, otherwise derives
/// `http://{registry}/api/chartrepo/{repo}/charts` from the docker section.
pub fn resolve_chart_repo_url(
    chart: &HelmChartSettings,
    docker: Option<&DockerSettings>,
) -> Option<String> {
    if let Some(url) = chart
        .chart_repo_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return Some(url.to_string());
    }

    let (registry, repo) = docker?.registry_repo()?;
    Some(format!("http://{}/api/chartrepo/{}/charts", registry, repo))
}

/// Chart push credentials, falling back to the docker registry user.
pub fn resolve_registry_user(
    chart: &HelmChartSettings,
    docker: Option<&DockerSettings>,
) -> Option<ResolvedUser> {
    chart
        .registry_user
        .as_ref()
        .or_else(|| docker.and_then(|d| d.registry_user.as_ref()))?
        .resolve()
}
