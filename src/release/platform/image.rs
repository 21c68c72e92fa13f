//! Container image packager.
//!
//! Runs on its own task. The result of the package step is published to
//! the [`BuildObserver`] so the chart bundle can include the built image.

use super::{ArtifactDescriptor, ArtifactKind, ArtifactPackager, Platform, Toolbox};
use crate::error::{PackError, Result};
use crate::release::builder::StepOutcome;
use crate::release::bundle::BundleAssembler;
use crate::release::docker::DOCKER_START_HELP;
use crate::release::goal::GoalSet;
use crate::release::observer::{BuildObserver, BuildResult, PublishGuard};
use crate::release::settings::{DockerSettings, Settings};
use crate::release::utils::fs;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

const IMAGE_README: &str = include_str!("../../../resources/docker/README.md");

/// Builds, pushes and exports the application image.
pub struct ImagePackager {
    settings: DockerSettings,
    goals: GoalSet,
    local_tag: String,
    remote_tag: Option<String>,
    archive_file: String,
    assembler: BundleAssembler,
    tools: Toolbox,
    guard: PublishGuard,
    built: bool,
    artifacts: Vec<ArtifactDescriptor>,
}

impl std::fmt::Debug for ImagePackager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePackager")
            .field("local_tag", &self.local_tag)
            .field("remote_tag", &self.remote_tag)
            .field("goals", &self.goals)
            .finish_non_exhaustive()
    }
}

impl ImagePackager {
    /// Creates an image packager publishing to `observer`.
    ///
    /// Dropping the packager without a published result publishes a failure.
    pub fn new(
        settings: &Settings,
        docker: DockerSettings,
        tools: Toolbox,
        observer: &BuildObserver,
    ) -> Self {
        let platform = Platform::Docker;
        let pack = &settings.pack;
        let local_tag = docker.local_tag(&pack.name, &pack.version);
        let archive_file = format!("{}.tar", local_tag.replace(['/', ':'], "-"));

        Self {
            goals: GoalSet::parse(&docker.goals),
            remote_tag: docker.remote_tag(&pack.name, &pack.version),
            local_tag,
            archive_file,
            assembler: BundleAssembler::new(
                settings.home_dir(),
                platform,
                &settings.archive_name(platform.dir_name()),
            ),
            settings: docker,
            tools,
            guard: observer.publish_guard(),
            built: false,
            artifacts: Vec::new(),
        }
    }

    fn dockerfile(&self) -> PathBuf {
        self.settings.context.join(&self.settings.dockerfile)
    }

    async fn build_image(&self) -> Result<()> {
        let dockerfile = self.dockerfile();
        if !dockerfile.is_file() {
            crate::bail!("Dockerfile not found at {}", dockerfile.display());
        }

        self.tools
            .engine
            .build(&self.settings.context, &dockerfile, &self.local_tag)
            .await?;

        if let Some(remote) = &self.remote_tag {
            self.tools.engine.tag(&self.local_tag, remote).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactPackager for ImagePackager {
    fn platform(&self) -> Platform {
        Platform::Docker
    }

    fn goals(&self) -> GoalSet {
        self.goals
    }

    async fn check_environment(&self) -> bool {
        match self.tools.engine.ping().await {
            Ok(()) => true,
            Err(e) => {
                log::warn!(
                    "[docker] skipped: no Docker environment detected ({}). {}",
                    e,
                    DOCKER_START_HELP
                );
                false
            }
        }
    }

    async fn prepare(&mut self) -> Result<()> {
        fs::create_dir_all(self.assembler.platform_dir(), true).await
    }

    async fn package(&mut self) -> bool {
        log::info!("[docker/package] building image {}", self.local_tag);
        match self.build_image().await {
            Ok(()) => {
                log::info!("[docker/package] ✓ built image {}", self.local_tag);
                self.built = true;
                self.guard.publish(BuildResult::success(&self.local_tag));
                true
            }
            Err(e) => {
                log::error!("[docker/package] failed: {}", e);
                self.guard.publish(BuildResult::failure());
                false
            }
        }
    }

    async fn push(&mut self) -> StepOutcome {
        let Some(remote) = self.remote_tag.clone() else {
            log::info!("[docker/push] skipped: docker.registry or docker.repo is not configured");
            return StepOutcome::NotConfigured;
        };

        if let Some(user) = self.settings.registry_user.as_ref().and_then(|u| u.resolve()) {
            let registry = self.settings.registry_repo().map(|(r, _)| r.to_string());
            if let Some(registry) = registry
                && let Err(e) = self.tools.engine.login(&registry, &user).await
            {
                log::error!("[docker/push] failed: login to {} failed: {}", registry, e);
                return StepOutcome::Failed;
            }
        }

        match self.tools.engine.push(&remote).await {
            Ok(()) => {
                log::info!("[docker/push] ✓ pushed image {}", remote);
                StepOutcome::Succeeded
            }
            Err(e) => {
                log::error!("[docker/push] failed: {}", e);
                StepOutcome::Failed
            }
        }
    }

    async fn save(&mut self, _cancel: &CancellationToken) -> Result<()> {
        if !self.built {
            return Err(PackError::save(
                "[docker/save] failed: no image was built",
                PackError::GenericError("package step did not run".to_string()),
            ));
        }

        let dest = self.assembler.platform_dir().join(&self.archive_file);
        self.tools
            .engine
            .export_images(std::slice::from_ref(&self.local_tag), &dest)
            .await
            .map_err(|e| {
                PackError::save(
                    format!("[docker/save] failed: could not export image {}", self.local_tag),
                    e,
                )
            })?;
        log::info!("[docker/save] ✓ exported image to {}", dest.display());
        self.artifacts
            .push(ArtifactDescriptor::new(dest, ArtifactKind::ImageArchive));

        self.assembler
            .stage_resources(IMAGE_README, &self.settings.resources)
            .await?;
        let archive = self.assembler.compress().await?;
        self.artifacts.push(archive);
        Ok(())
    }

    fn artifacts(&self) -> &[ArtifactDescriptor] {
        &self.artifacts
    }
}
