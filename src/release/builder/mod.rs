//! Release orchestration.
//!
//! This module provides the [`ReleaseOrchestrator`] that runs every
//! configured platform and the per-platform [`run_pipeline`] that turns a
//! goal set into package / push / save calls.
//!
//! # Overview
//!
//! The orchestrator:
//! 1. Creates the image build observer
//! 2. Spawns the image pipeline on its own task
//! 3. Runs the chart pipeline on the calling task
//! 4. Joins both and calculates artifact checksums
//! 5. Returns a [`ReleaseReport`]
//!
//! # Example
//!
//! ```no_run
//! use release_pack::release::{ReleaseOrchestrator, Settings, Toolbox};
//! use std::path::Path;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> release_pack::Result<()> {
//! let settings = Settings::load(Path::new("release-pack.toml"))?;
//! let orchestrator = ReleaseOrchestrator::new(settings, Toolbox::system()?);
//! let report = orchestrator.run(CancellationToken::new()).await?;
//!
//! for artifact in report.artifacts() {
//!     println!("{} {} ({} bytes)", artifact.kind, artifact.path.display(), artifact.size);
//! }
//! # Ok(())
//! # }
//! ```

mod checksum;
mod orchestrator;
mod pipeline;

pub use checksum::{FileDigest, digest_file};
pub use orchestrator::{ReleaseOrchestrator, ReleaseReport};
pub use pipeline::{
    BundledArtifact, PipelineReport, PipelineStatus, StepOutcome, StepRecord, run_pipeline,
};
