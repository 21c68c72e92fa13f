//! Shared fakes and fixtures for integration tests.
#![allow(dead_code)] // Each test binary uses a different subset

use async_trait::async_trait;
use release_pack::release::settings::ResolvedUser;
use release_pack::release::utils::http::ArtifactUploader;
use release_pack::release::utils::process::{CommandOutput, CommandRunner};
use release_pack::release::docker::ImageEngine;
use release_pack::release::{Settings, Toolbox};
use release_pack::{PackError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type Handler = dyn Fn(&[String]) -> Result<CommandOutput> + Send + Sync;

/// Command runner answering from a closure and recording every call.
pub struct FakeRunner {
    handler: Box<Handler>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeRunner {
    pub fn new(handler: impl Fn(&[String]) -> Result<CommandOutput> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// `helm <subcommand>` labels of every call.
    pub fn subcommands(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|argv| argv.iter().take(2).cloned().collect::<Vec<_>>().join(" "))
            .collect()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn execute_with_input(
        &self,
        argv: &[String],
        _input: Option<&[u8]>,
    ) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(argv.to_vec());
        (self.handler)(argv)
    }
}

pub fn stdout(text: &str) -> CommandOutput {
    CommandOutput {
        stdout: text.to_string(),
        stderr: String::new(),
        code: Some(0),
    }
}

pub fn command_error(argv: &[String], reason: &str) -> PackError {
    PackError::Command {
        command: argv.join(" "),
        reason: reason.to_string(),
    }
}

/// Runner emulating a working `helm` that writes the chart into `out_dir`.
pub fn helm_runner(out_dir: &Path) -> FakeRunner {
    let out_dir = out_dir.to_path_buf();
    FakeRunner::new(move |argv| match argv.get(1).map(String::as_str) {
        Some("version") => Ok(stdout(
            "version.BuildInfo{Version:\"v3.14.0\", GitCommit:\"abc\", GoVersion:\"go1.21\"}",
        )),
        Some("package") => {
            let tgz = out_dir.join("demo-0.1.0.tgz");
            std::fs::write(&tgz, b"chart-bytes").map_err(PackError::Io)?;
            Ok(stdout(&format!(
                "Successfully packaged chart and saved it to: {}\n",
                tgz.display()
            )))
        }
        _ => Err(command_error(argv, "unexpected command")),
    })
}

/// Runner whose `helm package` always fails.
pub fn failing_helm_runner() -> FakeRunner {
    FakeRunner::new(|argv| match argv.get(1).map(String::as_str) {
        Some("version") => Ok(stdout("version.BuildInfo{Version:\"v3.14.0\"}")),
        _ => Err(command_error(argv, "Error: chart.yaml file is missing")),
    })
}

/// Image engine recording calls. Export writes the tag list to the archive.
#[derive(Default)]
pub struct FakeEngine {
    pub calls: Mutex<Vec<String>>,
    pub ping_fails: bool,
    pub build_fails: bool,
    pub build_hangs: bool,
    pub build_delay: Option<Duration>,
    pub push_fails: bool,
    pub export_fails: bool,
}

impl FakeEngine {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn saves(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("save "))
            .collect()
    }
}

fn engine_error(what: &str) -> PackError {
    PackError::Command {
        command: format!("docker {}", what),
        reason: "Cannot connect to the Docker daemon".to_string(),
    }
}

#[async_trait]
impl ImageEngine for FakeEngine {
    async fn ping(&self) -> Result<()> {
        self.record("ping".to_string());
        if self.ping_fails {
            return Err(engine_error("info"));
        }
        Ok(())
    }

    async fn build(&self, _context: &Path, _dockerfile: &Path, tag: &str) -> Result<()> {
        self.record(format!("build {}", tag));
        if self.build_hangs {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.build_delay {
            tokio::time::sleep(delay).await;
        }
        if self.build_fails {
            return Err(engine_error("build"));
        }
        Ok(())
    }

    async fn tag(&self, source: &str, target: &str) -> Result<()> {
        self.record(format!("tag {} {}", source, target));
        Ok(())
    }

    async fn login(&self, registry: &str, user: &ResolvedUser) -> Result<()> {
        self.record(format!("login {} {}", registry, user.username));
        Ok(())
    }

    async fn push(&self, tag: &str) -> Result<()> {
        self.record(format!("push {}", tag));
        if self.push_fails {
            return Err(engine_error("push"));
        }
        Ok(())
    }

    async fn export_images(&self, tags: &[String], dest: &Path) -> Result<()> {
        self.record(format!("save {}", tags.join(" ")));
        if self.export_fails {
            return Err(engine_error("save"));
        }
        std::fs::write(dest, tags.join("\n")).map_err(PackError::Io)?;
        Ok(())
    }
}

/// Uploader recording `(file, url, username)` per call.
#[derive(Default)]
pub struct FakeUploader {
    pub calls: Mutex<Vec<(PathBuf, String, String)>>,
    pub fails: bool,
}

impl FakeUploader {
    pub fn calls(&self) -> Vec<(PathBuf, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactUploader for FakeUploader {
    async fn upload(&self, file: &Path, url: &str, user: &ResolvedUser) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((file.to_path_buf(), url.to_string(), user.username.clone()));
        if self.fails {
            return Err(PackError::GenericError(
                "repository answered 401 Unauthorized".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn toolbox(
    runner: &Arc<FakeRunner>,
    engine: &Arc<FakeEngine>,
    uploader: &Arc<FakeUploader>,
) -> Toolbox {
    Toolbox {
        runner: runner.clone(),
        engine: engine.clone(),
        uploader: uploader.clone(),
    }
}

/// Settings for the `demo` 0.1.0 pack writing into `home`, with extra TOML sections.
pub fn settings_with(home: &Path, sections: &str) -> Settings {
    let text = format!(
        "[pack]\nname = \"demo\"\nversion = \"0.1.0\"\nhome_dir = '{}'\n\n{}",
        home.display(),
        sections
    );
    Settings::from_toml_str(&text).expect("test settings should parse")
}

/// Creates a minimal chart directory under `root`.
pub fn chart_fixture(root: &Path) -> PathBuf {
    let chart = root.join("chart");
    std::fs::create_dir_all(chart.join("templates")).unwrap();
    std::fs::write(
        chart.join("Chart.yaml"),
        "apiVersion: v2\nname: demo\nversion: 0.1.0\n",
    )
    .unwrap();
    std::fs::write(chart.join("values.yaml"), "replicas: 1\n").unwrap();
    chart
}

/// Creates a build context with a Dockerfile under `root`.
pub fn docker_fixture(root: &Path) -> PathBuf {
    let context = root.join("app");
    std::fs::create_dir_all(&context).unwrap();
    std::fs::write(context.join("Dockerfile"), "FROM scratch\n").unwrap();
    context
}
