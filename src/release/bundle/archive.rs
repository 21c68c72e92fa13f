//! tar.gz creation for release bundles.

use crate::error::{ErrorExt, PackError, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::path::Path;
use tar::{Archive, Builder};

/// Compresses `dir` into a gzip'd tarball at `output`.
///
/// Entries are rooted at `root_name`, so unpacking yields a single
/// top-level directory.
pub async fn compress_dir(dir: &Path, root_name: &str, output: &Path) -> Result<()> {
    let dir = dir.to_path_buf();
    let root_name = root_name.to_string();
    let output = output.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        let file = File::create(&output).fs_context("creating archive", &output)?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = Builder::new(encoder);
        builder.follow_symlinks(false);

        builder
            .append_dir_all(&root_name, &dir)
            .fs_context("adding directory to archive", &dir)?;

        let encoder = builder.into_inner().fs_context("finishing archive", &output)?;
        encoder.finish().fs_context("flushing archive", &output)?;
        Ok(())
    })
    .await
    .map_err(|e| PackError::GenericError(format!("Archive task panicked: {}", e)))?
}

/// Lists entry paths of a tar.gz archive.
pub fn list_archive(archive_path: &Path) -> Result<Vec<String>> {
    let file = File::open(archive_path).fs_context("opening archive", archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));

    let mut entries = Vec::new();
    for entry in archive.entries().fs_context("reading archive", archive_path)? {
        let entry = entry.fs_context("reading archive entry", archive_path)?;
        let path = entry
            .path()
            .fs_context("reading archive entry path", archive_path)?;
        entries.push(path.to_string_lossy().into_owned());
    }
    Ok(entries)
}
