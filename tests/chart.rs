mod common;

use common::*;
use release_pack::release::bundle::list_archive;
use release_pack::release::{
    ArtifactKind, BuildObserver, ChartPackager, PipelineStatus, Step, StepOutcome, run_pipeline,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

struct Fixture {
    tmp: TempDir,
    runner: Arc<FakeRunner>,
    engine: Arc<FakeEngine>,
    uploader: Arc<FakeUploader>,
}

impl Fixture {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let helm_out = tmp.path().join("helm-out");
        std::fs::create_dir_all(&helm_out).unwrap();
        chart_fixture(tmp.path());
        Self {
            runner: Arc::new(helm_runner(&helm_out)),
            engine: Arc::new(FakeEngine::default()),
            uploader: Arc::new(FakeUploader::default()),
            tmp,
        }
    }

    fn with_runner(mut self, runner: FakeRunner) -> Self {
        self.runner = Arc::new(runner);
        self
    }

    fn with_engine(mut self, engine: FakeEngine) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    fn home(&self) -> std::path::PathBuf {
        self.tmp.path().join("home")
    }

    fn packager(&self, chart_section: &str) -> ChartPackager {
        let text = format!(
            "[helm_chart]\nlocation = '{}'\n{}",
            self.tmp.path().join("chart").display(),
            chart_section
        );
        let settings = settings_with(&self.home(), &text);
        let chart = settings.helm_chart.clone().unwrap();
        ChartPackager::new(
            &settings,
            chart,
            toolbox(&self.runner, &self.engine, &self.uploader),
            BuildObserver::disabled(),
        )
    }
}

fn archive_entries(path: &Path) -> Vec<String> {
    list_archive(path).unwrap()
}

#[tokio::test]
async fn package_moves_chart_into_home() {
    let fx = Fixture::new();
    let mut packager = fx.packager("goals = [\"package\"]");

    let report = run_pipeline(&mut packager, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.status, PipelineStatus::Completed);
    assert_eq!(report.executed(), vec![Step::Package]);
    assert_eq!(report.outcome(Step::Package), Some(StepOutcome::Succeeded));

    let packaged = fx.home().join("demo-0.1.0.tgz");
    assert!(packaged.is_file());
    assert!(!fx.tmp.path().join("helm-out/demo-0.1.0.tgz").exists());
    assert_eq!(packager.chart_path(), Some(packaged.as_path()));
    assert!(!fx.home().join("demo-0.1.0-helm-chart.tar.gz").exists());

    assert_eq!(report.artifacts.len(), 1);
    assert_eq!(report.artifacts[0].kind, ArtifactKind::ChartArchive);
    assert_eq!(report.artifacts[0].size, "chart-bytes".len() as u64);
    assert_eq!(report.artifacts[0].checksum.len(), 64);

    let calls = fx.runner.calls();
    assert_eq!(fx.runner.subcommands(), vec!["helm version", "helm package"]);
    assert!(Path::new(&calls[1][2]).is_absolute());
}

#[tokio::test]
async fn chart_already_in_home_is_kept() {
    let fx = Fixture::new();
    let home = fx.home();
    std::fs::create_dir_all(&home).unwrap();
    let fx = fx.with_runner(helm_runner(&home));
    let mut packager = fx.packager("goals = [\"package\"]");

    let report = run_pipeline(&mut packager, &CancellationToken::new())
        .await
        .unwrap();

    let packaged = fx.home().join("demo-0.1.0.tgz");
    assert_eq!(report.outcome(Step::Package), Some(StepOutcome::Succeeded));
    assert_eq!(std::fs::read(&packaged).unwrap(), b"chart-bytes");
    assert_eq!(report.artifacts.len(), 1);
    assert_eq!(report.artifacts[0].path, packaged);
    assert_eq!(report.artifacts[0].size, "chart-bytes".len() as u64);
}

#[tokio::test]
async fn package_honors_custom_file_name() {
    let fx = Fixture::new();
    let mut packager = fx.packager("goals = [\"package\"]\nfile_name = \"custom.tgz\"");

    run_pipeline(&mut packager, &CancellationToken::new())
        .await
        .unwrap();

    assert!(fx.home().join("custom.tgz").is_file());
    assert!(!fx.home().join("demo-0.1.0.tgz").exists());
}

#[tokio::test]
async fn missing_location_fails_package_and_skips_the_rest() {
    let fx = Fixture::new();
    std::fs::remove_dir_all(fx.tmp.path().join("chart")).unwrap();
    let mut packager = fx.packager("goals = [\"package\", \"push\", \"save\"]");

    let report = run_pipeline(&mut packager, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.outcome(Step::Package), Some(StepOutcome::Failed));
    assert_eq!(report.outcome(Step::Push), Some(StepOutcome::Skipped));
    assert_eq!(report.outcome(Step::Save), Some(StepOutcome::Skipped));
    assert_eq!(report.executed(), vec![Step::Package]);
    assert_eq!(fx.runner.subcommands(), vec!["helm version"]);
    assert!(fx.uploader.calls().is_empty());
    assert!(report.artifacts.is_empty());
}

#[tokio::test]
async fn location_must_be_a_directory() {
    let fx = Fixture::new();
    let file = fx.tmp.path().join("not-a-chart.txt");
    std::fs::write(&file, "x").unwrap();

    let text = format!("[helm_chart]\nlocation = '{}'\ngoals = [\"package\"]", file.display());
    let settings = settings_with(&fx.home(), &text);
    let mut packager = ChartPackager::new(
        &settings,
        settings.helm_chart.clone().unwrap(),
        toolbox(&fx.runner, &fx.engine, &fx.uploader),
        BuildObserver::disabled(),
    );

    let report = run_pipeline(&mut packager, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.outcome(Step::Package), Some(StepOutcome::Failed));
}

#[tokio::test]
async fn helm_output_without_success_fails_package() {
    let fx = Fixture::new().with_runner(FakeRunner::new(|argv| {
        match argv.get(1).map(String::as_str) {
            Some("version") => Ok(stdout("version.BuildInfo{Version:\"v3.14.0\"}")),
            _ => Ok(stdout("Error: validation: chart.metadata.name is required\n")),
        }
    }));
    let mut packager = fx.packager("goals = [\"package\"]");

    let report = run_pipeline(&mut packager, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.outcome(Step::Package), Some(StepOutcome::Failed));
    assert!(packager.chart_path().is_none());
}

#[tokio::test]
async fn reported_chart_must_exist() {
    let fx = Fixture::new().with_runner(FakeRunner::new(|argv| {
        match argv.get(1).map(String::as_str) {
            Some("version") => Ok(stdout("version.BuildInfo{Version:\"v3.14.0\"}")),
            _ => Ok(stdout(
                "Successfully packaged chart and saved it to: /nonexistent/demo-0.1.0.tgz",
            )),
        }
    }));
    let mut packager = fx.packager("goals = [\"package\"]");

    let report = run_pipeline(&mut packager, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.outcome(Step::Package), Some(StepOutcome::Failed));
}

#[tokio::test]
async fn missing_helm_skips_the_platform() {
    let fx = Fixture::new().with_runner(FakeRunner::new(|argv| {
        Err(command_error(argv, "program not found"))
    }));
    let mut packager = fx.packager("goals = [\"package\", \"save\"]");

    let report = run_pipeline(&mut packager, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.status, PipelineStatus::EnvironmentMissing);
    assert!(report.steps.is_empty());
    assert!(!fx.home().join("helm-chart").exists());
}

#[tokio::test]
async fn unexpected_helm_version_output_skips_the_platform() {
    let fx = Fixture::new().with_runner(FakeRunner::new(|_| Ok(stdout("helm: command mangled"))));
    let mut packager = fx.packager("goals = [\"package\"]");

    let report = run_pipeline(&mut packager, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.status, PipelineStatus::EnvironmentMissing);
}

#[tokio::test]
async fn save_bundles_chart_images_and_docs() {
    let fx = Fixture::new();
    let mut packager = fx.packager(
        "goals = [\"save\"]\nsave_images = [\"nginx:1.25\", \" \", \"redis:7\"]",
    );

    let report = run_pipeline(&mut packager, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.executed(), vec![Step::Package, Step::Save]);
    assert_eq!(fx.engine.saves(), vec!["save nginx:1.25 redis:7"]);

    let archive = fx.home().join("demo-0.1.0-helm-chart.tar.gz");
    assert!(archive.is_file());
    let entries = archive_entries(&archive);
    for expected in [
        "helm-chart/demo-0.1.0.tgz",
        "helm-chart/images.tar",
        "helm-chart/README.md",
    ] {
        assert!(entries.iter().any(|e| e == expected), "missing {expected} in {entries:?}");
    }
    assert!(entries.iter().any(|e| e.starts_with("helm-chart/docs")));

    let kinds: Vec<ArtifactKind> = report.artifacts.iter().map(|a| a.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ArtifactKind::ChartArchive,
            ArtifactKind::ImageArchive,
            ArtifactKind::ReleaseArchive
        ]
    );
}

#[tokio::test]
async fn save_uses_custom_images_file_name() {
    let fx = Fixture::new();
    let mut packager = fx.packager(
        "goals = [\"save\"]\nsave_images = [\"nginx:1.25\"]\nsave_image_file_name = \"offline.tar\"",
    );

    run_pipeline(&mut packager, &CancellationToken::new())
        .await
        .unwrap();
    assert!(fx.home().join("helm-chart/offline.tar").is_file());
}

#[tokio::test]
async fn save_without_images_skips_export() {
    let fx = Fixture::new();
    let mut packager = fx.packager("goals = [\"save\"]");

    let report = run_pipeline(&mut packager, &CancellationToken::new())
        .await
        .unwrap();

    assert!(fx.engine.calls().is_empty());
    assert!(!fx.home().join("helm-chart/images.tar").exists());
    assert_eq!(report.outcome(Step::Save), Some(StepOutcome::Succeeded));
}

#[tokio::test]
async fn unreachable_engine_does_not_fail_save() {
    let fx = Fixture::new().with_engine(FakeEngine {
        ping_fails: true,
        ..Default::default()
    });
    let mut packager = fx.packager("goals = [\"save\"]\nsave_images = [\"nginx:1.25\"]");

    let report = run_pipeline(&mut packager, &CancellationToken::new())
        .await
        .unwrap();

    assert!(fx.engine.saves().is_empty());
    assert!(fx.home().join("demo-0.1.0-helm-chart.tar.gz").is_file());
    assert!(
        report
            .artifacts
            .iter()
            .all(|a| a.kind != ArtifactKind::ImageArchive)
    );
}

#[tokio::test]
async fn resources_are_copied_and_may_replace_readme() {
    let fx = Fixture::new();
    let resources = fx.tmp.path().join("resources");
    std::fs::create_dir_all(resources.join("extra")).unwrap();
    std::fs::write(resources.join("extra/install.sh"), "#!/bin/sh\n").unwrap();
    std::fs::write(resources.join("README.md"), "custom readme\n").unwrap();

    let section = format!(
        "goals = [\"save\"]\nresources = ['{}', '{}']",
        resources.join("extra").display(),
        resources.join("README.md").display()
    );
    let mut packager = fx.packager(&section);

    run_pipeline(&mut packager, &CancellationToken::new())
        .await
        .unwrap();

    let staged = fx.home().join("helm-chart");
    assert!(staged.join("extra/install.sh").is_file());
    assert_eq!(
        std::fs::read_to_string(staged.join("README.md")).unwrap(),
        "custom readme\n"
    );

    let entries = archive_entries(&fx.home().join("demo-0.1.0-helm-chart.tar.gz"));
    assert!(entries.iter().any(|e| e == "helm-chart/extra/install.sh"));
}

#[tokio::test]
async fn missing_resource_fails_the_run() {
    let fx = Fixture::new();
    let section = format!(
        "goals = [\"save\"]\nresources = ['{}']",
        fx.tmp.path().join("nope.txt").display()
    );
    let mut packager = fx.packager(&section);

    let err = run_pipeline(&mut packager, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("[helm-chart/save] failed"), "{err}");
    assert!(!fx.home().join("demo-0.1.0-helm-chart.tar.gz").exists());
}

#[tokio::test]
async fn stale_staging_files_do_not_reach_the_bundle() {
    let fx = Fixture::new();
    let staging = fx.home().join("helm-chart");
    std::fs::create_dir_all(&staging).unwrap();
    std::fs::write(staging.join("images.tar"), "from an earlier run").unwrap();

    let mut packager = fx.packager("goals = [\"save\"]");
    run_pipeline(&mut packager, &CancellationToken::new())
        .await
        .unwrap();

    let entries = archive_entries(&fx.home().join("demo-0.1.0-helm-chart.tar.gz"));
    assert!(!entries.iter().any(|e| e == "helm-chart/images.tar"));
}
