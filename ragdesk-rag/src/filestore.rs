//! On-disk vector store with atomic replacement.
//!
//! The configured directory holds a single `index.json` file. A new snapshot
//! is first written to a uniquely named temporary file in the same directory,
//! flushed to disk, and then renamed over `index.json`. Rename within a
//! directory is atomic, so readers either open the previous file or the new
//! one. Temporary files left behind by an interrupted write are ignored by
//! [`load`](VectorStore::load) and removed by [`clear`](VectorStore::clear).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{RagError, Result};
use crate::index::IndexSnapshot;
use crate::vectorstore::VectorStore;

/// File name of the committed snapshot.
pub const INDEX_FILE: &str = "index.json";

const BACKEND: &str = "file";

/// A [`VectorStore`] persisted as JSON under a directory.
///
/// # Example
///
/// ```rust,ignore
/// use ragdesk_rag::{FileVectorStore, VectorStore};
///
/// let store = FileVectorStore::new("vector_db");
/// if store.exists().await {
///     let snapshot = store.load().await?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileVectorStore {
    dir: PathBuf,
}

/// A snapshot written to a temporary file but not yet visible to readers.
pub(crate) struct StagedSnapshot {
    temp_path: PathBuf,
}

impl FileVectorStore {
    /// Create a store rooted at `dir`. Nothing is touched until the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the index.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    fn io_error(&self, action: &str, err: std::io::Error) -> RagError {
        RagError::VectorStoreError {
            backend: BACKEND.into(),
            message: format!("failed to {action} {}: {err}", self.dir.display()),
        }
    }

    /// Write `snapshot` to a fresh temporary file and flush it to disk.
    pub(crate) async fn stage(&self, snapshot: &IndexSnapshot) -> Result<StagedSnapshot> {
        let bytes = serde_json::to_vec(snapshot).map_err(|e| RagError::VectorStoreError {
            backend: BACKEND.into(),
            message: format!("failed to serialize index: {e}"),
        })?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| self.io_error("create", e))?;

        let temp_path = self.dir.join(format!("{INDEX_FILE}.{}.tmp", Uuid::new_v4()));
        let written = async {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            file.write_all(&bytes).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            discard(&temp_path).await;
            return Err(self.io_error("write snapshot in", e));
        }
        debug!(path = %temp_path.display(), bytes = bytes.len(), "staged index snapshot");
        Ok(StagedSnapshot { temp_path })
    }

    /// Atomically publish a staged snapshot as the current index.
    pub(crate) async fn commit(&self, staged: StagedSnapshot) -> Result<()> {
        if let Err(e) = tokio::fs::rename(&staged.temp_path, self.index_path()).await {
            discard(&staged.temp_path).await;
            return Err(self.io_error("commit snapshot in", e));
        }
        // Persist the rename itself; failure here leaves a valid index either way.
        if let Ok(dir) = tokio::fs::File::open(&self.dir).await {
            if let Err(e) = dir.sync_all().await {
                warn!(dir = %self.dir.display(), error = %e, "failed to sync index directory");
            }
        }
        Ok(())
    }
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove temporary snapshot");
        }
    }
}

#[async_trait]
impl VectorStore for FileVectorStore {
    fn location(&self) -> String {
        self.dir.display().to_string()
    }

    async fn replace(&self, snapshot: IndexSnapshot) -> Result<()> {
        let staged = self.stage(&snapshot).await?;
        self.commit(staged).await?;
        info!(dir = %self.dir.display(), entries = snapshot.len(), "index persisted");
        Ok(())
    }

    async fn load(&self) -> Result<Arc<IndexSnapshot>> {
        let bytes = match tokio::fs::read(self.index_path()).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RagError::NotFound { location: self.location() });
            }
            Err(e) => return Err(self.io_error("read", e)),
        };

        let corrupt = |message: String| RagError::IndexCorruption { location: self.location(), message };
        let snapshot: IndexSnapshot =
            serde_json::from_slice(&bytes).map_err(|e| corrupt(format!("unreadable snapshot: {e}")))?;
        snapshot.validate().map_err(corrupt)?;

        debug!(dir = %self.dir.display(), entries = snapshot.len(), "index loaded");
        Ok(Arc::new(snapshot))
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {
                info!(dir = %self.dir.display(), "index cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error("remove", e)),
        }
    }

    async fn exists(&self) -> bool {
        tokio::fs::try_exists(self.index_path()).await.unwrap_or(false)
    }
}
