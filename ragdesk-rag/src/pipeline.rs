//! Ingestion and retrieval pipeline.
//!
//! The [`RagPipeline`] coordinates the full ingest-and-query workflow by
//! composing an [`ExtractorRegistry`], a [`Chunker`], an
//! [`EmbeddingProvider`] and a [`VectorStore`].
//!
//! # Example
//!
//! ```rust,ignore
//! use ragdesk_rag::{RagPipeline, RagConfig, FileVectorStore};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(FileVectorStore::new("vector_db")))
//!     .build()?;
//!
//! let report = pipeline.ingest(&inputs).await?;
//! let results = pipeline.query("What is this document about?").await?;
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::extract::{ExtractorRegistry, IngestInput};
use crate::index::IndexSnapshot;
use crate::vectorstore::VectorStore;

/// Per-document result of an ingestion batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentReport {
    pub filename: String,
    pub chunk_count: usize,
}

/// A document that was skipped during ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestFailure {
    pub filename: String,
    pub message: String,
}

/// Outcome of [`RagPipeline::ingest`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// Documents that were indexed, in input order.
    pub documents: Vec<DocumentReport>,
    /// Documents that were skipped, in input order.
    pub failures: Vec<IngestFailure>,
    /// Number of chunks in the new index.
    pub total_chunks: usize,
}

/// State of the stored index.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexStatus {
    Ready { entries: usize, dimensions: usize, embedding_model: String, created_at: DateTime<Utc> },
    Missing,
    Corrupted(String),
}

/// The ingestion and retrieval pipeline.
///
/// Ingestion runs extract → chunk → embed → replace; queries run
/// load → embed → search → filter. Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    extractors: ExtractorRegistry,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Extract, chunk, embed and index a batch of uploaded files.
    ///
    /// Files are processed in the order given. A file without extractable text
    /// is reported in [`IngestReport::failures`] and the rest of the batch
    /// continues. Repeated file names are indexed as `name (2)`, `name (3)`,
    /// and so on. The resulting index replaces any existing one.
    ///
    /// # Errors
    ///
    /// - [`RagError::ExtractionError`] if no file yields any text; the stored
    ///   index is left untouched.
    /// - Embedding and storage errors from [`build`](Self::build).
    pub async fn ingest(&self, inputs: &[IngestInput]) -> Result<IngestReport> {
        let mut documents = Vec::new();
        let mut failures = Vec::new();
        let mut seen = HashSet::new();
        for outcome in self.extractors.extract_all(inputs).await {
            match outcome.result {
                Ok(mut document) => {
                    let id = unique_id(&mut seen, &document.id);
                    if id != document.id {
                        warn!(document = %document.id, renamed = %id, "duplicate file name in batch");
                        document.id = id;
                    }
                    documents.push(document);
                }
                Err(e) => failures.push(IngestFailure { filename: outcome.filename, message: e.to_string() }),
            }
        }

        if documents.is_empty() {
            let detail = failures
                .iter()
                .map(|f| format!("{}: {}", f.filename, f.message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(RagError::ExtractionError {
                document: "batch".into(),
                message: if detail.is_empty() { "no documents provided".into() } else { detail },
            });
        }

        let chunks = self.build(&documents).await?;

        let documents = documents
            .iter()
            .map(|d| DocumentReport {
                filename: d.id.clone(),
                chunk_count: chunks.iter().filter(|c| c.document_id == d.id).count(),
            })
            .collect();
        let report = IngestReport { documents, failures, total_chunks: chunks.len() };
        info!(
            indexed = report.documents.len(),
            skipped = report.failures.len(),
            chunks = report.total_chunks,
            "ingestion complete"
        );
        Ok(report)
    }

    /// Chunk and embed `documents`, then replace the stored index with them.
    ///
    /// Returns the stored chunks (with embeddings attached). Nothing is
    /// written unless every chunk was embedded.
    ///
    /// # Errors
    ///
    /// - [`RagError::ExtractionError`] if two documents share an id or the
    ///   documents produce no chunks.
    /// - [`RagError::EmbeddingError`] if the embedding service fails.
    /// - [`RagError::VectorStoreError`] if persisting fails.
    pub async fn build(&self, documents: &[Document]) -> Result<Vec<Chunk>> {
        let mut ids = HashSet::new();
        if let Some(duplicate) = documents.iter().find(|d| !ids.insert(d.id.as_str())) {
            return Err(RagError::ExtractionError {
                document: duplicate.id.clone(),
                message: "another document in the batch has the same id".into(),
            });
        }

        let mut chunks: Vec<Chunk> = documents.iter().flat_map(|d| self.chunker.chunk(d)).collect();
        if chunks.is_empty() {
            return Err(RagError::ExtractionError {
                document: "batch".into(),
                message: "documents contain no text to index".into(),
            });
        }

        self.embed_chunks(&mut chunks).await?;

        let snapshot = IndexSnapshot::new(chunks.clone(), self.embedding_provider.model_name())?;
        self.vector_store.replace(snapshot).await.map_err(|e| {
            error!(location = %self.vector_store.location(), error = %e, "failed to persist index");
            e
        })?;

        info!(documents = documents.len(), chunks = chunks.len(), "index rebuilt");
        Ok(chunks)
    }

    /// Attach embeddings to `chunks`, one service call per configured batch.
    async fn embed_chunks(&self, chunks: &mut [Chunk]) -> Result<()> {
        for batch in chunks.chunks_mut(self.config.embedding_batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
                error!(error = %e, "embedding failed during ingestion");
                e
            })?;
            if embeddings.len() != batch.len() {
                return Err(RagError::EmbeddingError {
                    provider: self.embedding_provider.model_name().to_string(),
                    message: format!(
                        "expected {} embeddings, got {}",
                        batch.len(),
                        embeddings.len()
                    ),
                });
            }
            for (chunk, embedding) in batch.iter_mut().zip(embeddings) {
                chunk.embedding = embedding;
            }
        }
        Ok(())
    }

    /// Load the current index snapshot.
    ///
    /// # Errors
    ///
    /// [`RagError::NotFound`] or [`RagError::IndexCorruption`] if no usable
    /// index is stored.
    pub async fn load(&self) -> Result<Arc<IndexSnapshot>> {
        self.vector_store.load().await
    }

    /// Query the index: load → embed → search → filter by threshold.
    ///
    /// Returns at most `top_k` results ordered by descending score.
    pub async fn query(&self, question: &str) -> Result<Vec<SearchResult>> {
        self.query_with_top_k(question, self.config.top_k).await
    }

    /// Like [`query`](Self::query) with an explicit result count.
    pub async fn query_with_top_k(&self, question: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        // Load first so a missing index is reported before any service call.
        let snapshot = self.load().await?;

        let query_embedding = self.embedding_provider.embed(question).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            e
        })?;

        let results = snapshot.search(&query_embedding, top_k)?;
        let threshold = self.config.similarity_threshold;
        let filtered: Vec<SearchResult> =
            results.into_iter().filter(|r| r.score >= threshold).collect();

        info!(result_count = filtered.len(), top_k, "query completed");
        Ok(filtered)
    }

    /// Delete the stored index.
    pub async fn clear(&self) -> Result<()> {
        self.vector_store.clear().await
    }

    /// Whether an index has been stored. Does not validate it.
    pub async fn is_ready(&self) -> bool {
        self.vector_store.exists().await
    }

    /// Describe the stored index, validating it.
    pub async fn status(&self) -> IndexStatus {
        match self.load().await {
            Ok(snapshot) => {
                let manifest = snapshot.manifest();
                IndexStatus::Ready {
                    entries: manifest.entry_count,
                    dimensions: manifest.dimensions,
                    embedding_model: manifest.embedding_model.clone(),
                    created_at: manifest.created_at,
                }
            }
            Err(RagError::NotFound { .. }) => IndexStatus::Missing,
            Err(e) => {
                warn!(error = %e, "index is not usable");
                IndexStatus::Corrupted(e.to_string())
            }
        }
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `config`, `embedding_provider` and `vector_store` are required. The
/// chunker defaults to a [`RecursiveChunker`] sized from the config and the
/// extractors default to [`ExtractorRegistry::default()`].
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    extractors: Option<ExtractorRegistry>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Override the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Override the extractor registry.
    pub fn extractors(mut self, extractors: ExtractorRegistry) -> Self {
        self.extractors = Some(extractors);
        self
    }

    /// Build the [`RagPipeline`], validating the config and required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing or
    /// the config is invalid.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(RecursiveChunker::try_new(config.chunk_size, config.chunk_overlap)?),
        };

        Ok(RagPipeline {
            config,
            embedding_provider,
            vector_store,
            chunker,
            extractors: self.extractors.unwrap_or_default(),
        })
    }
}

/// `name`, or `name (2)`, `name (3)`, ... if already taken.
fn unique_id(seen: &mut HashSet<String>, name: &str) -> String {
    let mut candidate = name.to_string();
    let mut n = 1;
    while seen.contains(&candidate) {
        n += 1;
        candidate = format!("{name} ({n})");
    }
    seen.insert(candidate.clone());
    candidate
}
