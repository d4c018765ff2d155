//! Upload candidates: a label file's name, size, and payload.
//!
//! A candidate built from a path only records the file's metadata; the bytes
//! are read when the file is actually sent. Validation therefore never reads
//! an oversized file into memory, and a file that disappears between
//! selection and conversion fails for that file alone.

use crate::error::LabelZplError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where a candidate's bytes come from.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Bytes already held in memory.
    Memory(Vec<u8>),
    /// A local file, read on demand.
    File(PathBuf),
}

/// A file the user selected for conversion.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    name: String,
    size: u64,
    payload: Payload,
}

impl UploadCandidate {
    /// Wrap an in-memory buffer.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            payload: Payload::Memory(bytes),
        }
    }

    /// Resolve a local path, validating existence and readability.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, LabelZplError> {
        let path = path.as_ref().to_path_buf();

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LabelZplError::FileNotFound { path });
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(LabelZplError::PermissionDenied { path });
            }
            Err(source) => return Err(LabelZplError::ReadFailed { path, source }),
        };
        if !metadata.is_file() {
            return Err(LabelZplError::FileNotFound { path });
        }

        // Check read permission by attempting to open
        if let Err(e) = tokio::fs::File::open(&path).await {
            return Err(if e.kind() == std::io::ErrorKind::PermissionDenied {
                LabelZplError::PermissionDenied { path }
            } else {
                LabelZplError::ReadFailed { path, source: e }
            });
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!("Resolved local file: {} ({} bytes)", path.display(), metadata.len());
        Ok(Self {
            name,
            size: metadata.len(),
            payload: Payload::File(path),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Size in megabytes (MiB).
    pub fn size_mb(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0)
    }

    /// Lower-case text after the last dot, if the name has one.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Load the bytes to send.
    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        match &self.payload {
            Payload::Memory(bytes) => Ok(bytes.clone()),
            Payload::File(path) => tokio::fs::read(path).await,
        }
    }
}

/// Lower-case extension of a file name, without the dot.
pub fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || ext.contains('/') {
        return None;
    }
    Some(ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("label.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension_of("archive.tar.png").as_deref(), Some("png"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of("trailing."), None);
        assert_eq!(extension_of("dir.d/file"), None);
    }

    #[test]
    fn from_bytes_records_size() {
        let c = UploadCandidate::from_bytes("a.pdf", vec![0u8; 2048]);
        assert_eq!(c.size(), 2048);
        assert_eq!(c.name(), "a.pdf");
        assert_eq!(c.extension().as_deref(), Some("pdf"));
        assert_eq!(tokio_test::block_on(c.read()).unwrap().len(), 2048);
    }

    #[tokio::test]
    async fn from_path_reads_metadata_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.png");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"\x89PNG....").unwrap();
        drop(f);

        let c = UploadCandidate::from_path(&path).await.unwrap();
        assert_eq!(c.name(), "label.png");
        assert_eq!(c.size(), 8);
        assert!(matches!(c.payload(), Payload::File(_)));

        // Removing the file only fails the read, not the candidate.
        std::fs::remove_file(&path).unwrap();
        assert!(c.read().await.is_err());
    }

    #[tokio::test]
    async fn from_path_missing_file() {
        let err = UploadCandidate::from_path("/definitely/not/here.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, LabelZplError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn from_path_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = UploadCandidate::from_path(dir.path()).await.unwrap_err();
        assert!(matches!(err, LabelZplError::FileNotFound { .. }));
    }
}
