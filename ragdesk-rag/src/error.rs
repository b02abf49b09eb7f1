//! Error types for the `ragdesk-rag` crate.

use thiserror::Error;

/// Errors that can occur in ingestion, indexing and retrieval.
#[derive(Debug, Error)]
pub enum RagError {
    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An I/O or consistency error in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// No index has been built at the configured location.
    #[error("No index found at {location}")]
    NotFound {
        /// Where the index was looked for.
        location: String,
    },

    /// A persisted index exists but could not be loaded.
    #[error("Index at {location} is corrupted: {message}")]
    IndexCorruption {
        /// Where the index was read from.
        location: String,
        /// What failed validation.
        message: String,
    },

    /// A document yielded no usable text.
    #[error("Extraction error ({document}): {message}")]
    ExtractionError {
        /// The document (file name) that failed.
        document: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    /// Whether the caller should be told to ingest documents first.
    ///
    /// A corrupted index is never trusted, so it is reported the same way as
    /// a missing one.
    pub fn requires_ingestion(&self) -> bool {
        matches!(self, RagError::NotFound { .. } | RagError::IndexCorruption { .. })
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
