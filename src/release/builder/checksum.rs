//! Artifact size and checksum calculation.

use crate::error::{ErrorExt, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

const CHUNK_SIZE: usize = 64 * 1024;

/// Size and SHA-256 of a file, measured in one streaming pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    /// Bytes read
    pub size: u64,
    /// Hex-encoded SHA-256 (64 characters)
    pub sha256: String,
}

/// Streams `path` once, counting bytes and hashing them.
///
/// Image archives can be several gigabytes, so the file is never loaded
/// whole.
pub async fn digest_file(path: &Path) -> Result<FileDigest> {
    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening file for hashing", path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut size = 0u64;

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hashing", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        size += n as u64;
    }

    Ok(FileDigest {
        size,
        sha256: format!("{:x}", hasher.finalize()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn digest_of_known_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("x.tgz");
        std::fs::write(&path, b"hello").unwrap();

        let digest = digest_file(&path).await.unwrap();
        assert_eq!(digest.size, 5);
        assert_eq!(
            digest.sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[tokio::test]
    async fn content_larger_than_one_chunk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("images.tar");
        std::fs::write(&path, vec![7u8; CHUNK_SIZE * 2 + 3]).unwrap();

        let digest = digest_file(&path).await.unwrap();
        assert_eq!(digest.size, (CHUNK_SIZE * 2 + 3) as u64);
        assert_eq!(digest.sha256.len(), 64);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(digest_file(&tmp.path().join("absent")).await.is_err());
    }
}
