//! # ragdesk-rag
//!
//! Document ingestion and retrieval for ragdesk.
//!
//! ## Overview
//!
//! This crate turns uploaded files into a persisted vector index and answers
//! similarity queries against it:
//!
//! - [`ExtractorRegistry`] - text extraction from PDF, text and markdown files
//! - [`RecursiveChunker`] / [`FixedSizeChunker`] - overlapping character windows
//! - [`EmbeddingProvider`] - pluggable embedding backends
//! - [`FileVectorStore`] / [`InMemoryVectorStore`] - whole-index storage with
//!   atomic replacement
//! - [`RagPipeline`] - ingest → chunk → embed → replace, and query
//! - [`RetrieverTool`] - exposes the pipeline to an agent as a tool
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragdesk_rag::{FileVectorStore, IngestInput, RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .vector_store(Arc::new(FileVectorStore::new("vector_db")))
//!     .build()?;
//!
//! pipeline.ingest(&[IngestInput::from_path("manual.pdf").await?]).await?;
//! for hit in pipeline.query("How do I reset the device?").await? {
//!     println!("{:.3} {}", hit.score, hit.chunk.text);
//! }
//! ```
//!
//! ## Features
//!
//! - `openai` - [`OpenAIEmbeddingProvider`] for OpenAI-compatible embedding
//!   endpoints (OpenAI, DashScope compatible mode, vLLM, etc.)

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod filestore;
pub mod index;
pub mod inmemory;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod tool;
pub mod vectorstore;

pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker, reconstruct};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use extract::{
    DocumentExtractor, ExtractionOutcome, ExtractorRegistry, IngestInput, PdfExtractor,
    TextExtractor,
};
pub use filestore::{FileVectorStore, INDEX_FILE};
pub use index::{FORMAT_VERSION, IndexManifest, IndexSnapshot};
pub use inmemory::InMemoryVectorStore;
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
pub use pipeline::{
    DocumentReport, IndexStatus, IngestFailure, IngestReport, RagPipeline, RagPipelineBuilder,
};
pub use tool::{DEFAULT_TOOL_DESCRIPTION, DEFAULT_TOOL_NAME, RetrieverTool};
pub use vectorstore::VectorStore;
