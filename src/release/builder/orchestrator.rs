//! Main release orchestration and coordination.

use super::pipeline::{BundledArtifact, PipelineReport, run_pipeline};
use crate::error::{PackError, Result};
use crate::release::goal::{Goal, GoalSet};
use crate::release::observer::BuildObserver;
use crate::release::platform::{ChartPackager, ImagePackager, Platform, Toolbox};
use crate::release::settings::Settings;
use crate::release::utils::fs;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Outcome of a full release run.
#[derive(Debug, Clone, Default)]
pub struct ReleaseReport {
    /// One entry per configured platform.
    pub pipelines: Vec<PipelineReport>,
    /// The run was cancelled before every platform finished.
    pub interrupted: bool,
}

impl ReleaseReport {
    /// Report of `platform`, if it was configured.
    pub fn pipeline(&self, platform: Platform) -> Option<&PipelineReport> {
        self.pipelines.iter().find(|p| p.platform == platform)
    }

    /// Every produced artifact.
    pub fn artifacts(&self) -> impl Iterator<Item = &BundledArtifact> {
        self.pipelines.iter().flat_map(|p| p.artifacts.iter())
    }
}

/// Main release orchestrator.
///
/// Runs the image platform on a spawned task and the chart platform on
/// the calling task. The chart save step waits for the image build through
/// a shared [`BuildObserver`].
pub struct ReleaseOrchestrator {
    settings: Settings,
    tools: Toolbox,
}

impl std::fmt::Debug for ReleaseOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseOrchestrator")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ReleaseOrchestrator {
    /// Creates an orchestrator.
    pub fn new(settings: Settings, tools: Toolbox) -> Self {
        Self { settings, tools }
    }

    /// Whether the chart bundle should wait for the image build.
    ///
    /// True when the image platform declares goals and the chart platform
    /// saves a bundle that includes the built image.
    pub fn observer_enabled(&self) -> bool {
        let image_builds = self
            .settings
            .docker
            .as_ref()
            .is_some_and(|d| !GoalSet::parse(&d.goals).is_empty());
        let chart_saves = self.settings.helm_chart.as_ref().is_some_and(|c| {
            c.include_built_image && GoalSet::parse(&c.goals).contains(Goal::Save)
        });
        image_builds && chart_saves
    }

    /// Runs every configured platform.
    ///
    /// Step failures are reported in the returned [`ReleaseReport`]. Only
    /// fatal errors (save archive, output directories) are returned as
    /// `Err`. When `cancel` fires, waiting stops, the image task is aborted
    /// and the report is marked interrupted.
    pub async fn run(&self, cancel: CancellationToken) -> Result<ReleaseReport> {
        if self.settings.docker.is_none() && self.settings.helm_chart.is_none() {
            log::warn!("Nothing to do: neither [docker] nor [helm_chart] is configured");
            return Ok(ReleaseReport::default());
        }

        if self.settings.pack.clean {
            log::info!("Cleaning {}", self.settings.home_dir().display());
            fs::remove_dir_all(self.settings.home_dir()).await?;
        }

        let observer = BuildObserver::new(self.observer_enabled());
        let image_task = self.spawn_image_pipeline(&observer, &cancel);

        let chart_report = match self.settings.helm_chart.clone() {
            Some(chart) => {
                let mut packager =
                    ChartPackager::new(&self.settings, chart, self.tools.clone(), observer);
                match run_pipeline(&mut packager, &cancel).await {
                    Ok(report) => Some(report),
                    Err(e) => {
                        if let Some(handle) = image_task {
                            handle.abort();
                        }
                        return Err(e);
                    }
                }
            }
            None => {
                log::info!("[helm-chart] skipped: no [helm_chart] section configured");
                None
            }
        };

        let mut report = ReleaseReport::default();

        let image_result = match image_task {
            Some(mut handle) => tokio::select! {
                biased;
                joined = &mut handle => Some(joined),
                _ = cancel.cancelled() => {
                    handle.abort();
                    log::warn!("[docker] interrupted: image pipeline aborted");
                    report.interrupted = true;
                    None
                }
            },
            None => None,
        };

        if let Some(joined) = image_result {
            let pipeline = joined
                .map_err(|e| PackError::GenericError(format!("Image pipeline task failed: {}", e)))
                .and_then(|result| result);
            match pipeline {
                Ok(pipeline) => report.pipelines.push(pipeline),
                Err(e) => {
                    if let Some(chart) = &chart_report {
                        log_completed(chart);
                    }
                    return Err(e);
                }
            }
        }
        report.pipelines.extend(chart_report);

        if cancel.is_cancelled() {
            report.interrupted = true;
            log::warn!("Release run interrupted");
        }
        Ok(report)
    }

    fn spawn_image_pipeline(
        &self,
        observer: &BuildObserver,
        cancel: &CancellationToken,
    ) -> Option<JoinHandle<Result<PipelineReport>>> {
        let Some(docker) = self.settings.docker.clone() else {
            log::info!("[docker] skipped: no [docker] section configured");
            return None;
        };

        let mut packager = ImagePackager::new(&self.settings, docker, self.tools.clone(), observer);
        let cancel = cancel.clone();
        Some(tokio::spawn(async move {
            run_pipeline(&mut packager, &cancel).await
        }))
    }
}

/// Logs what a finished pipeline produced when the run as a whole fails.
fn log_completed(report: &PipelineReport) {
    for record in &report.steps {
        log::info!("[{}/{}] {:?}", report.platform, record.step, record.outcome);
    }
    for artifact in &report.artifacts {
        log::info!(
            "[{}] produced {} ({} bytes, sha256 {})",
            report.platform,
            artifact.path.display(),
            artifact.size,
            artifact.checksum
        );
    }
}
