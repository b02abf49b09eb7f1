//! Vector store trait for persisting and loading index snapshots.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::index::IndexSnapshot;

/// A storage backend holding at most one [`IndexSnapshot`].
///
/// Every ingestion batch rebuilds the index from scratch, so stores only
/// support whole-index replacement. Implementations must make `replace`
/// atomic: a concurrent `load` sees either the previous snapshot or the new
/// one, never a mix.
///
/// # Example
///
/// ```rust,ignore
/// use ragdesk_rag::{FileVectorStore, VectorStore};
///
/// let store = FileVectorStore::new("vector_db");
/// store.replace(snapshot).await?;
/// let snapshot = store.load().await?;
/// let results = snapshot.search(&query_embedding, 4)?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Human-readable location of the index, used in messages.
    fn location(&self) -> String;

    /// Persist `snapshot`, replacing whatever was stored before.
    async fn replace(&self, snapshot: IndexSnapshot) -> Result<()>;

    /// Load the stored snapshot.
    ///
    /// # Errors
    ///
    /// - [`RagError::NotFound`](crate::RagError::NotFound) if nothing is stored.
    /// - [`RagError::IndexCorruption`](crate::RagError::IndexCorruption) if the
    ///   stored data fails validation. Nothing is returned in that case.
    async fn load(&self) -> Result<Arc<IndexSnapshot>>;

    /// Delete the stored snapshot. Clearing an empty store is a no-op.
    async fn clear(&self) -> Result<()>;

    /// Whether a snapshot is stored. Does not validate it.
    async fn exists(&self) -> bool;
}
