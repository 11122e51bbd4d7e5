//! Read-only access to artifact bytes on local disk.
//!
//! Blobs live under a single root directory, at the artifact key. The store
//! never writes; uploads land through other means.

mod checksum;
mod media;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::model::Artifact;
use crate::path::StorePath;

pub use checksum::{digest_file, digest_reader, ContentMd5};
pub use media::content_type;

/// Read size used when streaming or digesting a blob.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The catalog has a record but the bytes are gone
    #[error("blob missing for artifact {0}")]
    Missing(String),
    #[error("invalid blob key: {0:?}")]
    InvalidKey(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Blob files rooted at one directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
    chunk_size: usize,
}

/// An opened artifact, ready to be streamed.
#[derive(Debug, Clone)]
pub struct Blob {
    key: String,
    path: PathBuf,
    len: u64,
    modified: Option<SystemTime>,
}

impl Blob {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size on disk, which is what gets served regardless of the recorded size.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Where the blob for `key` lives on disk.
    ///
    /// Only canonical keys are accepted, so the result never leaves the root.
    pub fn locate(&self, key: &str) -> Result<PathBuf, BlobError> {
        let path = StorePath::from_key(key).map_err(|_| BlobError::InvalidKey(key.to_string()))?;
        if path.is_root() || path.key() != key {
            return Err(BlobError::InvalidKey(key.to_string()));
        }
        Ok(path
            .key()
            .split('/')
            .fold(self.root.clone(), |acc, segment| acc.join(segment)))
    }

    /// Stat the blob behind `artifact`.
    ///
    /// A missing file, or a directory where the file should be, is
    /// [`BlobError::Missing`].
    pub async fn open(&self, artifact: &Artifact) -> Result<Blob, BlobError> {
        let path = self.locate(artifact.key())?;
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BlobError::Missing(artifact.key().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            return Err(BlobError::Missing(artifact.key().to_string()));
        }

        if metadata.len() != artifact.size() {
            tracing::warn!(
                artifact = %artifact,
                recorded = artifact.size(),
                on_disk = metadata.len(),
                "blob size differs from catalog"
            );
        }

        Ok(Blob {
            key: artifact.key().to_string(),
            path,
            len: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }

    /// MD5 of the blob's current bytes.
    pub async fn checksum(&self, blob: &Blob) -> Result<ContentMd5, BlobError> {
        match digest_file(blob.path(), self.chunk_size).await {
            Ok(digest) => Ok(digest),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::Missing(blob.key().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
