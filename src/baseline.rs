//! This module contains the baseline persistence layer: one opaque text value
//! per monitor identity, the comparison point for the next check.

use std::path::PathBuf;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// Errors that can occur in the baseline persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The underlying storage was unreadable or unwritable.
    #[error("Baseline storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Represents the baseline persistence interface.
///
/// Absence of a baseline is a valid initial state, reported as the empty
/// string rather than an error. Writes fully overwrite the previous value.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BaselineStore: Send + Sync {
    /// Retrieves the persisted baseline for `identity`, or the empty string
    /// if none exists yet.
    async fn read(&self, identity: &str) -> Result<String, StoreError>;

    /// Atomically replaces the persisted baseline for `identity`.
    async fn write(&self, identity: &str, value: &str) -> Result<(), StoreError>;
}

/// A `BaselineStore` backed by one plain-text file per monitor identity.
pub struct FileBaselineStore {
    dir: PathBuf,
}

impl FileBaselineStore {
    /// Creates a new store rooted at `dir`. The directory is created lazily
    /// on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, identity: &str) -> PathBuf {
        self.dir.join(identity)
    }
}

#[async_trait]
impl BaselineStore for FileBaselineStore {
    async fn read(&self, identity: &str) -> Result<String, StoreError> {
        match tokio::fs::read_to_string(self.path_for(identity)).await {
            Ok(value) => Ok(value),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, identity: &str, value: &str) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write to a sibling temp file and rename over the target, so a
        // concurrent reader never observes a torn write.
        let path = self.path_for(identity);
        let tmp = self.dir.join(format!("{identity}.tmp"));
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
