//! Per-platform step pipeline.

use super::checksum::digest_file;
use crate::error::Result;
use crate::release::goal::Step;
use crate::release::platform::{ArtifactKind, ArtifactPackager, Platform};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Result of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step ran and succeeded.
    Succeeded,
    /// Step ran and failed.
    Failed,
    /// Step ran but had nothing to do: its destination is not configured.
    NotConfigured,
    /// Step did not run because packaging failed.
    Skipped,
}

impl From<bool> for StepOutcome {
    fn from(ok: bool) -> Self {
        if ok {
            StepOutcome::Succeeded
        } else {
            StepOutcome::Failed
        }
    }
}

/// One planned step and what happened to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRecord {
    /// Step
    pub step: Step,
    /// Outcome
    pub outcome: StepOutcome,
}

/// How far a platform pipeline got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    /// No recognized goal was declared.
    NoGoals,
    /// Required tooling is missing.
    EnvironmentMissing,
    /// Steps were executed.
    Completed,
}

/// Artifact metadata reported after a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledArtifact {
    /// What the file is
    pub kind: ArtifactKind,
    /// Location
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Hex SHA-256
    pub checksum: String,
}

/// Outcome of one platform pipeline.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Platform
    pub platform: Platform,
    /// Pipeline status
    pub status: PipelineStatus,
    /// Planned steps in execution order
    pub steps: Vec<StepRecord>,
    /// Produced files
    pub artifacts: Vec<BundledArtifact>,
}

impl PipelineReport {
    fn skipped(platform: Platform, status: PipelineStatus) -> Self {
        Self {
            platform,
            status,
            steps: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    /// Steps that actually ran, in order.
    pub fn executed(&self) -> Vec<Step> {
        self.steps
            .iter()
            .filter(|r| r.outcome != StepOutcome::Skipped)
            .map(|r| r.step)
            .collect()
    }

    /// Outcome of `step`, if it was planned.
    pub fn outcome(&self, step: Step) -> Option<StepOutcome> {
        self.steps.iter().find(|r| r.step == step).map(|r| r.outcome)
    }
}

/// Runs the steps planned for the packager's goal set.
///
/// A failed package step skips every later step. Push and save do not
/// affect each other. Only a save error or a failure to create the output
/// directory is returned as `Err`.
pub async fn run_pipeline<P>(packager: &mut P, cancel: &CancellationToken) -> Result<PipelineReport>
where
    P: ArtifactPackager + ?Sized,
{
    let platform = packager.platform();
    let goals = packager.goals();

    if goals.is_empty() {
        log::warn!(
            "[{}] skipped: no recognized goals (expected package, push or save)",
            platform
        );
        return Ok(PipelineReport::skipped(platform, PipelineStatus::NoGoals));
    }

    if !packager.check_environment().await {
        return Ok(PipelineReport::skipped(
            platform,
            PipelineStatus::EnvironmentMissing,
        ));
    }

    packager.prepare().await?;
    log::info!("[{}] running goals {}", platform, goals);

    let mut steps = Vec::with_capacity(goals.steps().len());
    let mut packaged = true;

    for &step in goals.steps() {
        if !packaged {
            log::warn!("[{}/{}] skipped: package step failed", platform, step);
            steps.push(StepRecord {
                step,
                outcome: StepOutcome::Skipped,
            });
            continue;
        }

        let outcome = match step {
            Step::Package => {
                packaged = packager.package().await;
                StepOutcome::from(packaged)
            }
            Step::Push => packager.push().await,
            Step::Save => {
                packager.save(cancel).await?;
                StepOutcome::Succeeded
            }
        };
        steps.push(StepRecord { step, outcome });
    }

    let descriptors = packager.artifacts().to_vec();
    let mut artifacts = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        let digest = digest_file(&descriptor.path).await?;
        artifacts.push(BundledArtifact {
            kind: descriptor.kind,
            path: descriptor.path,
            size: digest.size,
            checksum: digest.sha256,
        });
    }

    log::info!("[{}] done: {} artifact(s)", platform, artifacts.len());
    Ok(PipelineReport {
        platform,
        status: PipelineStatus::Completed,
        steps,
        artifacts,
    })
}
