//! File system helpers for release staging.
//!
//! Staging directories are recreated per run, and resources are copied with
//! symlinks resolved so a bundle never points outside itself.

use crate::error::{ErrorExt, PackError, Result};
use std::io;
use std::path::Path;
use tokio::fs;

/// Creates `path` and its parents, emptying it first when `erase` is set.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes a directory tree. A missing directory is not an error.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PackError::Fs {
            context: "removing directory",
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Copies a regular file, creating the destination's parent directories.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        crate::bail!("{from:?} does not exist");
    }
    if !from.is_file() {
        crate::bail!("{from:?} is not a file");
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .await
            .fs_context("creating directory", parent)?;
    }
    fs::copy(from, to).await.fs_context("copying file to", to)?;
    Ok(())
}

/// Whether `a` and `b` resolve to the same existing file.
pub async fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a).await, fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Recursively copies the directory `from` to `to`.
///
/// Symlinks are followed and their targets copied as regular entries.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        crate::bail!("{from:?} is not a directory");
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        for entry in walkdir::WalkDir::new(&from).follow_links(true) {
            let entry = entry.map_err(|e| {
                PackError::GenericError(format!("walking {}: {}", from.display(), e))
            })?;
            let relative = entry
                .path()
                .strip_prefix(&from)
                .map_err(|e| PackError::GenericError(e.to_string()))?;
            let dest = to.join(relative);

            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest).fs_context("creating directory", &dest)?;
            } else {
                std::fs::copy(entry.path(), &dest).fs_context("copying file to", &dest)?;
            }
        }
        Ok(())
    })
    .await
    .map_err(|e| PackError::GenericError(format!("Directory copy task panicked: {}", e)))?
}

/// Copies a file or directory into `dest_dir`, keeping its name.
pub async fn copy_into(src: &Path, dest_dir: &Path) -> Result<()> {
    let name = src
        .file_name()
        .ok_or_else(|| PackError::GenericError(format!("{src:?} has no file name")))?;
    let dest = dest_dir.join(name);

    if src.is_dir() {
        copy_dir(src, &dest).await
    } else {
        copy_file(src, &dest).await
    }
}
