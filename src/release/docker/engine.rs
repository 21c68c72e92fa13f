//! Docker CLI backed image engine.

use crate::error::Result;
use crate::release::settings::ResolvedUser;
use crate::release::utils::process::CommandRunner;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Platform-specific Docker startup instructions
#[cfg(target_os = "macos")]
pub const DOCKER_START_HELP: &str = "Start Docker Desktop from Applications or Spotlight";

#[cfg(not(target_os = "macos"))]
pub const DOCKER_START_HELP: &str = "Start Docker daemon: sudo systemctl start docker";

/// Operations on a container image engine.
#[async_trait]
pub trait ImageEngine: Send + Sync {
    /// Checks that the engine is reachable.
    async fn ping(&self) -> Result<()>;

    /// Builds `dockerfile` in `context` as `tag`.
    async fn build(&self, context: &Path, dockerfile: &Path, tag: &str) -> Result<()>;

    /// Adds `target` as another name for `source`.
    async fn tag(&self, source: &str, target: &str) -> Result<()>;

    /// Logs into `registry`.
    async fn login(&self, registry: &str, user: &ResolvedUser) -> Result<()>;

    /// Pushes `tag` to its registry.
    async fn push(&self, tag: &str) -> Result<()>;

    /// Exports `tags` as a single image archive written to `dest`.
    async fn export_images(&self, tags: &[String], dest: &Path) -> Result<()>;
}

/// [`ImageEngine`] driving the `docker` CLI.
#[derive(Clone)]
pub struct DockerCli {
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for DockerCli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockerCli").finish_non_exhaustive()
    }
}

impl DockerCli {
    /// Creates an engine running commands through `runner`.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    async fn docker<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S> + Send,
        S: Into<String>,
    {
        self.docker_with_input(args, None).await
    }

    async fn docker_with_input<I, S>(&self, args: I, input: Option<&[u8]>) -> Result<String>
    where
        I: IntoIterator<Item = S> + Send,
        S: Into<String>,
    {
        let argv: Vec<String> = std::iter::once("docker".to_string())
            .chain(args.into_iter().map(Into::into))
            .collect();
        let output = self.runner.execute_with_input(&argv, input).await?;
        log::debug!("docker {} output:\n{}", argv[1], output.stdout.trim());
        Ok(output.stdout)
    }
}

#[async_trait]
impl ImageEngine for DockerCli {
    async fn ping(&self) -> Result<()> {
        self.docker(["info", "--format", "{{.ServerVersion}}"]).await?;
        Ok(())
    }

    async fn build(&self, context: &Path, dockerfile: &Path, tag: &str) -> Result<()> {
        self.docker([
            "build".to_string(),
            "-t".to_string(),
            tag.to_string(),
            "-f".to_string(),
            dockerfile.display().to_string(),
            context.display().to_string(),
        ])
        .await?;
        Ok(())
    }

    async fn tag(&self, source: &str, target: &str) -> Result<()> {
        self.docker(["tag", source, target]).await?;
        Ok(())
    }

    async fn login(&self, registry: &str, user: &ResolvedUser) -> Result<()> {
        self.docker_with_input(
            ["login", "--username", user.username.as_str(), "--password-stdin", registry],
            Some(user.password.as_bytes()),
        )
        .await?;
        Ok(())
    }

    async fn push(&self, tag: &str) -> Result<()> {
        self.docker(["push", tag]).await?;
        Ok(())
    }

    async fn export_images(&self, tags: &[String], dest: &Path) -> Result<()> {
        let mut args = vec![
            "save".to_string(),
            "-o".to_string(),
            dest.display().to_string(),
        ];
        args.extend(tags.iter().cloned());
        self.docker(args).await?;
        Ok(())
    }
}
