//! In-memory vector store.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! single `Arc<IndexSnapshot>` slot protected by a `tokio::sync::RwLock`. It is
//! suitable for development, testing, and sessions that do not need the index
//! to survive a restart.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{RagError, Result};
use crate::index::IndexSnapshot;
use crate::vectorstore::VectorStore;

const LOCATION: &str = "memory";

/// An in-memory vector store. Replacing the index swaps a pointer, so readers
/// holding the previous snapshot are unaffected.
///
/// # Example
///
/// ```rust,ignore
/// use ragdesk_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.replace(snapshot).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    current: RwLock<Option<Arc<IndexSnapshot>>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn location(&self) -> String {
        LOCATION.to_string()
    }

    async fn replace(&self, snapshot: IndexSnapshot) -> Result<()> {
        debug!(entries = snapshot.len(), "replacing in-memory index");
        *self.current.write().await = Some(Arc::new(snapshot));
        Ok(())
    }

    async fn load(&self) -> Result<Arc<IndexSnapshot>> {
        self.current
            .read()
            .await
            .clone()
            .ok_or_else(|| RagError::NotFound { location: LOCATION.to_string() })
    }

    async fn clear(&self) -> Result<()> {
        self.current.write().await.take();
        Ok(())
    }

    async fn exists(&self) -> bool {
        self.current.read().await.is_some()
    }
}
