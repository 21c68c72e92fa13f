//! Command line interface for the release packager.

mod args;

pub use args::Args;

use crate::error::{CliError, Result};
use crate::release::{ReleaseOrchestrator, ReleaseReport, Settings, Toolbox};
use tokio_util::sync::CancellationToken;

/// Exit code for a run interrupted by Ctrl-C
pub const EXIT_INTERRUPTED: i32 = 130;

/// Main CLI entry point
pub async fn run(args: Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let settings = load_settings(&args)?;
    let orchestrator = ReleaseOrchestrator::new(settings, Toolbox::system()?);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, stopping...");
            ctrl_c.cancel();
        }
    });

    let report = orchestrator.run(cancel).await?;
    print_summary(&report);

    Ok(if report.interrupted { EXIT_INTERRUPTED } else { 0 })
}

/// Loads the config file and applies command line overrides
pub fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = Settings::load(&args.config)?;
    if let Some(home) = &args.home_dir {
        settings.pack.home_dir = home.clone();
    }
    if args.clean {
        settings.pack.clean = true;
    }
    Ok(settings)
}

fn print_summary(report: &ReleaseReport) {
    for pipeline in &report.pipelines {
        let steps: Vec<String> = pipeline
            .steps
            .iter()
            .map(|r| format!("{}={:?}", r.step, r.outcome))
            .collect();
        println!(
            "{}: {:?} [{}]",
            pipeline.platform,
            pipeline.status,
            steps.join(", ")
        );
    }
    for artifact in report.artifacts() {
        println!(
            "  {:<8} {} ({} bytes, sha256 {})",
            artifact.kind.to_string(),
            artifact.path.display(),
            artifact.size,
            artifact.checksum
        );
    }
}
