//! Configuration structures for release packaging.
//!
//! Settings are read from a TOML file (`release-pack.toml` by default).
//! Each platform section is optional; a missing section skips that platform.

mod chart;
mod core;
mod docker;
mod registry;

pub use chart::HelmChartSettings;
pub use self::core::{DEFAULT_CONFIG_FILE, PackSettings, Settings};
pub use docker::DockerSettings;
pub use registry::{
    RegistryUser, ResolvedUser, resolve_chart_repo_url, resolve_registry_user,
};
