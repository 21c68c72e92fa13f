//! Helm chart packager.
//!
//! # Steps
//!
//! - **package**: `helm package <location>`, then move the `.tgz` into the
//!   home directory
//! - **push**: multipart upload to the chart repository
//! - **save**: export images, stage chart + docs + resources, compress

use super::{ArtifactDescriptor, ArtifactKind, ArtifactPackager, Platform, Toolbox};
use crate::error::{PackError, Result};
use crate::release::builder::StepOutcome;
use crate::release::bundle::{BundleAssembler, collect_save_images};
use crate::release::goal::GoalSet;
use crate::release::observer::BuildObserver;
use crate::release::settings::{
    DockerSettings, HelmChartSettings, Settings, resolve_chart_repo_url, resolve_registry_user,
};
use crate::release::utils::fs;
use async_trait::async_trait;
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

const HELM: &str = "helm";
const VERSION_MARKER: &str = "version";
const SUCCESS_MARKER: &str = "success";
const PATH_MARKER: &str = "to:";

const CHART_README: &str = include_str!("../../../resources/helm-chart/README.md");

/// Extracts the packaged chart path from `helm package` output.
///
/// Returns `None` unless the output reports success. The path is the text
/// after the last `to:`, trimmed.
///
/// # Examples
///
/// ```
/// use release_pack::release::platform::parse_package_output;
/// use std::path::PathBuf;
///
/// let out = "Successfully packaged chart and saved it to: /tmp/demo-1.0.0.tgz\n";
/// assert_eq!(parse_package_output(out), Some(PathBuf::from("/tmp/demo-1.0.0.tgz")));
/// assert_eq!(parse_package_output("Error: chart not found"), None);
/// ```
pub fn parse_package_output(output: &str) -> Option<PathBuf> {
    if !output.to_lowercase().contains(SUCCESS_MARKER) {
        return None;
    }
    let idx = output.rfind(PATH_MARKER)?;
    let path = output[idx + PATH_MARKER.len()..].trim();
    (!path.is_empty()).then(|| PathBuf::from(path))
}

/// Packages, pushes and bundles a Helm chart.
pub struct ChartPackager {
    settings: HelmChartSettings,
    docker: Option<DockerSettings>,
    home_dir: PathBuf,
    goals: GoalSet,
    assembler: BundleAssembler,
    tools: Toolbox,
    observer: BuildObserver,
    chart_path: Option<PathBuf>,
    artifacts: Vec<ArtifactDescriptor>,
}

impl std::fmt::Debug for ChartPackager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartPackager")
            .field("location", &self.settings.location)
            .field("goals", &self.goals)
            .field("chart_path", &self.chart_path)
            .finish_non_exhaustive()
    }
}

impl ChartPackager {
    /// Creates a chart packager.
    ///
    /// # Arguments
    ///
    /// * `settings` - Full release settings; the docker section supplies push fallbacks
    /// * `chart` - The `[helm_chart]` section
    /// * `tools` - External collaborators
    /// * `observer` - Image build observer consulted by the save step
    pub fn new(
        settings: &Settings,
        chart: HelmChartSettings,
        tools: Toolbox,
        observer: BuildObserver,
    ) -> Self {
        let platform = Platform::HelmChart;
        Self {
            goals: GoalSet::parse(&chart.goals),
            assembler: BundleAssembler::new(
                settings.home_dir(),
                platform,
                &settings.archive_name(platform.dir_name()),
            ),
            home_dir: settings.home_dir().to_path_buf(),
            docker: settings.docker.clone(),
            settings: chart,
            tools,
            observer,
            chart_path: None,
            artifacts: Vec::new(),
        }
    }

    /// Packaged chart in the home directory, once `package` succeeded.
    pub fn chart_path(&self) -> Option<&Path> {
        self.chart_path.as_deref()
    }

    /// Runs `helm package` and returns the reported `.tgz` path.
    async fn run_helm_package(&self, location: &Path) -> Result<PathBuf> {
        let argv = vec![
            HELM.to_string(),
            "package".to_string(),
            location.display().to_string(),
        ];
        let output = self.tools.runner.execute(&argv).await?;
        log::debug!("helm package output:\n{}", output.stdout.trim());

        let tgz = parse_package_output(&output.stdout).ok_or_else(|| {
            PackError::GenericError(format!(
                "helm package did not report success: {}",
                output.combined().trim()
            ))
        })?;

        if !tgz.is_file() {
            crate::bail!(
                "packaged chart not found at {} (helm output: {})",
                tgz.display(),
                output.stdout.trim()
            );
        }
        Ok(tgz)
    }

    /// Moves the packaged chart into the home directory.
    async fn move_to_home(&self, tgz: &Path) -> Result<PathBuf> {
        let file_name = match self
            .settings
            .file_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(name) => PathBuf::from(name),
            None => PathBuf::from(tgz.file_name().ok_or_else(|| {
                PackError::GenericError(format!("{tgz:?} has no file name"))
            })?),
        };

        let dest = self.home_dir.join(file_name);
        if fs::same_file(tgz, &dest).await {
            log::debug!("{} is already in place", dest.display());
            return Ok(dest);
        }
        fs::copy_file(tgz, &dest).await?;
        if let Err(e) = tokio::fs::remove_file(tgz).await {
            log::warn!(
                "[helm-chart/package] could not remove {}: {}",
                tgz.display(),
                e
            );
        }
        Ok(dest)
    }
}

#[async_trait]
impl ArtifactPackager for ChartPackager {
    fn platform(&self) -> Platform {
        Platform::HelmChart
    }

    fn goals(&self) -> GoalSet {
        self.goals
    }

    async fn check_environment(&self) -> bool {
        let argv = vec![HELM.to_string(), VERSION_MARKER.to_string()];
        match self.tools.runner.execute(&argv).await {
            Ok(output) => {
                log::debug!("helm version output:\n{}", output.stdout.trim());
                if output.combined().contains(VERSION_MARKER) {
                    true
                } else {
                    log::warn!(
                        "[helm-chart] skipped: unexpected `helm version` output: {}",
                        output.combined().trim()
                    );
                    false
                }
            }
            Err(e) => {
                log::warn!(
                    "[helm-chart] skipped: helm is not available ({}). \
                     Download it from https://github.com/helm/helm/releases and add it to PATH",
                    e
                );
                false
            }
        }
    }

    async fn prepare(&mut self) -> Result<()> {
        fs::create_dir_all(self.assembler.platform_dir(), true).await
    }

    async fn package(&mut self) -> bool {
        let location = &self.settings.location;
        if !location.exists() {
            log::warn!(
                "[helm-chart/package] failed: chart location {} does not exist, check helm_chart.location",
                location.display()
            );
            return false;
        }
        if !location.is_dir() {
            log::warn!(
                "[helm-chart/package] failed: chart location {} is not a directory, check helm_chart.location",
                location.display()
            );
            return false;
        }

        let location = match location.absolutize() {
            Ok(path) => path.into_owned(),
            Err(e) => {
                log::error!(
                    "[helm-chart/package] failed: cannot resolve {}: {}",
                    location.display(),
                    e
                );
                return false;
            }
        };

        let tgz = match self.run_helm_package(&location).await {
            Ok(tgz) => tgz,
            Err(e) => {
                log::error!("[helm-chart/package] failed: {}", e);
                return false;
            }
        };

        match self.move_to_home(&tgz).await {
            Ok(dest) => {
                log::info!("[helm-chart/package] ✓ packaged chart {}", dest.display());
                self.artifacts
                    .push(ArtifactDescriptor::new(&dest, ArtifactKind::ChartArchive));
                self.chart_path = Some(dest);
                true
            }
            Err(e) => {
                log::error!(
                    "[helm-chart/package] failed: could not copy the chart into {}: {}",
                    self.home_dir.display(),
                    e
                );
                false
            }
        }
    }

    async fn push(&mut self) -> StepOutcome {
        let Some(chart_path) = self.chart_path.clone() else {
            log::error!("[helm-chart/push] failed: no packaged chart to push");
            return StepOutcome::Failed;
        };

        let url = resolve_chart_repo_url(&self.settings, self.docker.as_ref());
        let user = resolve_registry_user(&self.settings, self.docker.as_ref());
        let (Some(url), Some(user)) = (url, user) else {
            log::info!(
                "[helm-chart/push] skipped: chart_repo_url or registry_user is not configured"
            );
            return StepOutcome::NotConfigured;
        };

        log::info!("[helm-chart/push] uploading {} to {}", chart_path.display(), url);
        match self.tools.uploader.upload(&chart_path, &url, &user).await {
            Ok(()) => {
                log::info!("[helm-chart/push] ✓ pushed chart to {}", url);
                StepOutcome::Succeeded
            }
            Err(e) => {
                log::error!("[helm-chart/push] failed: {}", e);
                StepOutcome::Failed
            }
        }
    }

    async fn save(&mut self, cancel: &CancellationToken) -> Result<()> {
        let chart_path = self.chart_path.clone().ok_or_else(|| {
            PackError::save(
                "[helm-chart/save] failed: no packaged chart to save",
                PackError::GenericError("package step did not run".to_string()),
            )
        })?;

        let images =
            collect_save_images(self.settings.static_images(), &self.observer, cancel).await;
        if let Some(images_archive) = self
            .assembler
            .export_images(
                self.tools.engine.as_ref(),
                &images,
                self.settings.images_file_name(),
            )
            .await
        {
            self.artifacts.push(images_archive);
        }

        self.assembler.stage_artifact(&chart_path).await?;
        self.assembler
            .stage_resources(CHART_README, &self.settings.resources)
            .await?;
        let archive = self.assembler.compress().await?;
        self.artifacts.push(archive);
        Ok(())
    }

    fn artifacts(&self) -> &[ArtifactDescriptor] {
        &self.artifacts
    }
}
