//! Release orchestration engine.
//!
//! Packages one application build into up to three artifacts:
//!
//! - a container image (`[docker]`)
//! - a Helm chart (`[helm_chart]`)
//! - an offline release archive per platform (the `save` goal)
//!
//! # Module Organization
//!
//! - [`builder`] - [`ReleaseOrchestrator`] and the per-platform step pipeline
//! - [`bundle`] - Save-step staging and tar.gz compression
//! - [`docker`] - Image engine seam and the docker CLI implementation
//! - [`goal`] - Goal parsing and the goal-set step table
//! - [`observer`] - Write-once image build handoff
//! - [`platform`] - Chart and image packagers
//! - [`settings`] - TOML configuration
//! - [`utils`] - File system, subprocess and HTTP helpers

pub mod builder;
pub mod bundle;
pub mod docker;
pub mod goal;
pub mod observer;
pub mod platform;
pub mod settings;
pub mod utils;

pub use builder::{
    BundledArtifact, PipelineReport, PipelineStatus, ReleaseOrchestrator, ReleaseReport,
    StepOutcome, StepRecord, run_pipeline,
};
pub use goal::{Goal, GoalSet, Step};
pub use observer::{BuildObserver, BuildResult, BuildStatus, WaitOutcome};
pub use platform::{
    ArtifactDescriptor, ArtifactKind, ArtifactPackager, ChartPackager, ImagePackager, Platform,
    Toolbox,
};
pub use settings::{DockerSettings, HelmChartSettings, RegistryUser, Settings};
