//! Platform packagers.
//!
//! Each platform produces one native artifact and implements the three
//! goal steps. The pipeline in [`crate::release::builder`] decides which
//! steps run and in what order.

mod chart;
mod image;

pub use chart::{ChartPackager, parse_package_output};
pub use image::ImagePackager;

use crate::error::Result;
use crate::release::builder::StepOutcome;
use crate::release::docker::{DockerCli, ImageEngine};
use crate::release::goal::GoalSet;
use crate::release::utils::http::{ArtifactUploader, ChartRepoUploader};
use crate::release::utils::process::{CommandRunner, SystemCommandRunner};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// External collaborators shared by the packagers.
#[derive(Clone)]
pub struct Toolbox {
    /// Runs `helm` and other programs
    pub runner: Arc<dyn CommandRunner>,
    /// Container image engine
    pub engine: Arc<dyn ImageEngine>,
    /// Chart repository uploader
    pub uploader: Arc<dyn ArtifactUploader>,
}

impl Toolbox {
    /// Real subprocesses, the docker CLI and an HTTP uploader.
    pub fn system() -> Result<Self> {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner::new());
        Ok(Self {
            engine: Arc::new(DockerCli::new(runner.clone())),
            uploader: Arc::new(ChartRepoUploader::new()?),
            runner,
        })
    }
}

/// Release platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Container image
    Docker,
    /// Helm chart
    HelmChart,
}

impl Platform {
    /// Subdirectory of the home directory owned by this platform.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Platform::Docker => "docker",
            Platform::HelmChart => "helm-chart",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Kind of file a packager produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Packaged chart (`.tgz`)
    ChartArchive,
    /// `docker save` output
    ImageArchive,
    /// Compressed release bundle
    ReleaseArchive,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArtifactKind::ChartArchive => "chart",
            ArtifactKind::ImageArchive => "images",
            ArtifactKind::ReleaseArchive => "release",
        })
    }
}

/// A file produced by a packager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    /// Location of the file
    pub path: PathBuf,
    /// What the file is
    pub kind: ArtifactKind,
}

impl ArtifactDescriptor {
    /// Creates a descriptor.
    pub fn new(path: impl Into<PathBuf>, kind: ArtifactKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A platform that can package, push and save one artifact.
///
/// Step methods log their own skips and failures. `package` reports
/// success as a boolean. `push` tells a failed upload apart from a push
/// with no configured destination. `save` returns an error only when the
/// release archive could not be produced.
#[async_trait]
pub trait ArtifactPackager: Send {
    /// Platform handled by this packager.
    fn platform(&self) -> Platform;

    /// Declared goals.
    fn goals(&self) -> GoalSet;

    /// Checks that the external tooling is available.
    async fn check_environment(&self) -> bool;

    /// Recreates the platform's empty staging directory.
    async fn prepare(&mut self) -> Result<()>;

    /// Produces the platform artifact.
    async fn package(&mut self) -> bool;

    /// Uploads the packaged artifact.
    async fn push(&mut self) -> StepOutcome;

    /// Assembles and compresses the release bundle.
    async fn save(&mut self, cancel: &CancellationToken) -> Result<()>;

    /// Files produced so far.
    fn artifacts(&self) -> &[ArtifactDescriptor];
}
