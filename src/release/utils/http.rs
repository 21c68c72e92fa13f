//! HTTP upload of packaged artifacts.

use crate::error::{ErrorExt, PackError, Result};
use crate::release::settings::ResolvedUser;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use std::time::Duration;
use tokio_util::io::ReaderStream;

/// Multipart field carrying the chart archive.
pub const CHART_FIELD: &str = "chart";

/// Timeout for a single upload (5 minutes).
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Uploads an artifact file to a remote repository.
#[async_trait]
pub trait ArtifactUploader: Send + Sync {
    /// Uploads `file` to `url`.
    ///
    /// `Ok(())` only for a 2xx response.
    async fn upload(&self, file: &Path, url: &str, user: &ResolvedUser) -> Result<()>;
}

/// Chart repository client (ChartMuseum / Harbor `api/chartrepo`).
#[derive(Debug, Clone)]
pub struct ChartRepoUploader {
    client: reqwest::Client,
}

impl ChartRepoUploader {
    /// Creates an uploader with the default timeout.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().timeout(UPLOAD_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ArtifactUploader for ChartRepoUploader {
    async fn upload(&self, file: &Path, url: &str, user: &ResolvedUser) -> Result<()> {
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| PackError::GenericError(format!("{file:?} has no file name")))?;

        let handle = tokio::fs::File::open(file)
            .await
            .fs_context("opening artifact", file)?;
        let length = handle
            .metadata()
            .await
            .fs_context("reading artifact metadata", file)?
            .len();

        let body = reqwest::Body::wrap_stream(ReaderStream::new(handle));
        let part = Part::stream_with_length(body, length)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;
        let form = Form::new().part(CHART_FIELD, part);

        let response = self
            .client
            .post(url)
            .basic_auth(&user.username, Some(&user.password))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(PackError::GenericError(format!(
            "repository answered {}: {}",
            status,
            body.trim()
        )))
    }
}
