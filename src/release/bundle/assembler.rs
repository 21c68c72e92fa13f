//! Staging and compression of a platform's release bundle.

use super::archive::compress_dir;
use crate::error::{ErrorExt, PackError, Result};
use crate::release::docker::{DOCKER_START_HELP, ImageEngine};
use crate::release::observer::{BuildObserver, WaitOutcome};
use crate::release::platform::{ArtifactDescriptor, ArtifactKind, Platform};
use crate::release::utils::fs;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

const DOCS_DIR: &str = "docs";
const README_FILE: &str = "README.md";

/// Resolves the images a chart bundle must carry.
///
/// Starts from the configured images and appends the tag produced by the
/// image build when the observer is enabled and the build succeeded. A
/// cancelled wait keeps the partial list.
pub async fn collect_save_images(
    static_images: Vec<String>,
    observer: &BuildObserver,
    cancel: &CancellationToken,
) -> Vec<String> {
    let mut images = static_images;

    match observer.wait(cancel).await {
        WaitOutcome::Disabled => {}
        WaitOutcome::Ready(result) => match result.artifact().map(str::trim) {
            Some(tag) if result.is_success() && !tag.is_empty() => {
                if !images.iter().any(|i| i == tag) {
                    images.push(tag.to_string());
                }
            }
            _ => log::warn!(
                "[helm-chart/save] skipped: image build did not succeed, built image not exported"
            ),
        },
        WaitOutcome::Cancelled => log::warn!(
            "[helm-chart/save] interrupted: stopped waiting for the image build, \
             exporting configured images only"
        ),
    }

    images
}

/// Builds one platform's release directory and archive.
#[derive(Debug, Clone)]
pub struct BundleAssembler {
    platform: Platform,
    platform_dir: PathBuf,
    archive_path: PathBuf,
}

impl BundleAssembler {
    /// Creates an assembler staging into `<home_dir>/<platform>/`.
    pub fn new(home_dir: &Path, platform: Platform, archive_name: &str) -> Self {
        Self {
            platform,
            platform_dir: home_dir.join(platform.dir_name()),
            archive_path: home_dir.join(archive_name),
        }
    }

    /// Staging directory.
    pub fn platform_dir(&self) -> &Path {
        &self.platform_dir
    }

    /// Final archive location.
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Exports `images` into the staging directory as `file_name`.
    ///
    /// Never fails the save step: an empty list, an unreachable engine or a
    /// failed export are logged and yield `None`.
    pub async fn export_images(
        &self,
        engine: &dyn ImageEngine,
        images: &[String],
        file_name: &str,
    ) -> Option<ArtifactDescriptor> {
        if images.is_empty() {
            log::info!(
                "[{}/save] skipped: no images to export",
                self.platform
            );
            return None;
        }

        log::info!(
            "[{}/save] exporting images: {}",
            self.platform,
            images.join(", ")
        );

        if let Err(e) = engine.ping().await {
            log::error!(
                "[{}/save] skipped: image engine unavailable, image export skipped ({}). {}",
                self.platform,
                e,
                DOCKER_START_HELP
            );
            return None;
        }

        let dest = self.platform_dir.join(file_name);
        match engine.export_images(images, &dest).await {
            Ok(()) => {
                log::info!("[{}/save] ✓ exported images to {}", self.platform, dest.display());
                Some(ArtifactDescriptor::new(dest, ArtifactKind::ImageArchive))
            }
            Err(e) => {
                log::error!("[{}/save] failed: image export failed: {}", self.platform, e);
                None
            }
        }
    }

    /// Copies the packaged artifact into the staging directory.
    pub async fn stage_artifact(&self, artifact: &Path) -> Result<PathBuf> {
        let name = artifact.file_name().ok_or_else(|| {
            PackError::GenericError(format!("{artifact:?} has no file name"))
        })?;
        let dest = self.platform_dir.join(name);

        fs::copy_file(artifact, &dest).await.map_err(|e| {
            PackError::save(
                format!(
                    "[{}/save] failed: could not copy {} into the release directory",
                    self.platform,
                    artifact.display()
                ),
                e,
            )
        })?;
        Ok(dest)
    }

    /// Creates `docs/`, writes `readme` unless a README exists and copies
    /// extra resources.
    pub async fn stage_resources(&self, readme: &str, resources: &[PathBuf]) -> Result<()> {
        self.try_stage_resources(readme, resources)
            .await
            .map_err(|e| {
                PackError::save(
                    format!(
                        "[{}/save] failed: could not copy release resources",
                        self.platform
                    ),
                    e,
                )
            })
    }

    async fn try_stage_resources(&self, readme: &str, resources: &[PathBuf]) -> Result<()> {
        let docs = self.platform_dir.join(DOCS_DIR);
        fs::create_dir_all(&docs, false).await?;

        for resource in resources {
            fs::copy_into(resource, &self.platform_dir).await?;
        }

        let readme_path = self.platform_dir.join(README_FILE);
        if !readme_path.exists() {
            tokio::fs::write(&readme_path, readme)
                .await
                .fs_context("writing README", &readme_path)?;
        }
        Ok(())
    }

    /// Compresses the staging directory into the release archive.
    pub async fn compress(&self) -> Result<ArtifactDescriptor> {
        compress_dir(
            &self.platform_dir,
            self.platform.dir_name(),
            &self.archive_path,
        )
        .await
        .map_err(|e| {
            PackError::save(
                format!(
                    "[{}/save] failed: could not compress the release archive {}",
                    self.platform,
                    self.archive_path.display()
                ),
                e,
            )
        })?;

        log::info!(
            "[{}/save] ✓ created release archive {}",
            self.platform,
            self.archive_path.display()
        );
        Ok(ArtifactDescriptor::new(
            self.archive_path.clone(),
            ArtifactKind::ReleaseArchive,
        ))
    }
}
