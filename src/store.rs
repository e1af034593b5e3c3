//! Asset store abstraction.
//!
//! The resolver never assumes a directory-listing API. A static file host
//! answers exactly one question, "does a GET for this path succeed?", and
//! [`AssetStore`] captures that contract: `fetch` returns the bytes or an
//! error, `probe` asks the same question and discards the body. Discovery and
//! lazy loading are written against the trait, so the page layer can inject
//! whatever transport it actually serves photos over.
//!
//! [`DirStore`] is the in-repo implementation: it serves URL-style paths
//! (`/photos/venue/image1.jpg`) from a local docroot, the way the static host
//! will once the site is deployed. Tests use the recording
//! [`MemoryStore`](tests::MemoryStore).

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("asset path rejected: {0}")]
    InvalidPath(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only source of encoded photo bytes, addressed by URL-style paths.
///
/// Any `Err` means "not servable". Callers never distinguish failure causes:
/// a network error and a missing file both read as absence.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Fetch the asset bytes at `path`.
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, StoreError>;

    /// Existence probe: succeeds iff [`fetch`](AssetStore::fetch) would.
    ///
    /// This is a full fetch with the body discarded: existence is defined
    /// by loadability, not by metadata.
    async fn probe(&self, path: &str) -> Result<(), StoreError> {
        self.fetch(path).await.map(|_| ())
    }
}

/// Serves assets from a local directory.
///
/// Maps `/photos/venue/image1.jpg` onto `<root>/photos/venue/image1.jpg`.
/// Paths containing `..` segments are rejected so a probe can never escape
/// the docroot.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        let trimmed = path.trim_start_matches('/');
        if trimmed.is_empty() || trimmed.split('/').any(|segment| segment == "..") {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(trimmed))
    }
}

#[async_trait]
impl AssetStore for DirStore {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        let file = self.resolve(path)?;
        match tokio::fs::read(&file).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
