//! The request handler behind every user-facing command.
//!
//! [`RagApp`] maps the user's actions (process files, ask, clear, check
//! status, start over) onto the pipeline and the agent. It never fails:
//! every outcome, including errors, comes back as a [`Reply`].

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use ragdesk_agent::{AgentEventStream, AnsweringAgent, AnsweringAgentBuilder, Answer};
use ragdesk_model::OpenAIClient;
use ragdesk_rag::{
    FileVectorStore, IndexStatus, IngestFailure, IngestInput, IngestReport, OpenAIEmbeddingProvider,
    RagError, RagPipeline, RetrieverTool,
};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::AppError;

/// Shown when a question arrives before any documents were processed.
pub const NO_INDEX_MESSAGE: &str = "No documents have been processed yet. \
Steps: 1) upload your PDF files  2) process them  3) ask your question.";

/// The result of a user action.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Answer(Answer),
    Ingested(IngestReport),
    Status(IndexStatus),
    /// Guidance that is not a failure, such as asking before ingesting.
    Notice(String),
    Error(String),
}

impl Reply {
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Answer(answer) => {
                write!(f, "{}", answer.text)?;
                if !answer.sources.is_empty() {
                    write!(f, "\n\nSources: {}", answer.sources.join(", "))?;
                }
                Ok(())
            }
            Reply::Ingested(report) => {
                write!(
                    f,
                    "Processed {} document(s) into {} chunks. You can start asking questions now.",
                    report.documents.len(),
                    report.total_chunks
                )?;
                for doc in &report.documents {
                    write!(f, "\n  {}: {} chunks", doc.filename, doc.chunk_count)?;
                }
                for failure in &report.failures {
                    write!(f, "\n  skipped {}: {}", failure.filename, failure.message)?;
                }
                Ok(())
            }
            Reply::Status(IndexStatus::Ready { entries, dimensions, embedding_model, created_at }) => {
                write!(
                    f,
                    "Index ready: {entries} chunks, {dimensions}-dimensional vectors from \
                     {embedding_model}, built {}",
                    created_at.format("%Y-%m-%d %H:%M:%S UTC")
                )
            }
            Reply::Status(IndexStatus::Missing) => write!(f, "Waiting for documents. {NO_INDEX_MESSAGE}"),
            Reply::Status(IndexStatus::Corrupted(reason)) => {
                write!(f, "The stored index is unusable ({reason}). Please process your PDF files again.")
            }
            Reply::Notice(text) => write!(f, "{text}"),
            Reply::Error(text) => write!(f, "Error: {text}"),
        }
    }
}

/// Turn a pipeline error into what the user sees.
fn rag_error_reply(err: &RagError) -> Reply {
    match err {
        // A corrupted index is never trusted; the user just re-ingests.
        e if e.requires_ingestion() => Reply::Notice(NO_INDEX_MESSAGE.to_string()),
        RagError::ExtractionError { .. } => {
            Reply::Error(format!("Could not extract text from the uploaded files. {err}"))
        }
        RagError::EmbeddingError { .. } => {
            Reply::Error(format!("The embedding service is unavailable. {err}"))
        }
        other => Reply::Error(other.to_string()),
    }
}

/// The application: one pipeline and one answering agent.
pub struct RagApp {
    pipeline: Arc<RagPipeline>,
    agent: AnsweringAgent,
}

impl RagApp {
    pub fn new(pipeline: Arc<RagPipeline>, agent: AnsweringAgent) -> Self {
        Self { pipeline, agent }
    }

    /// Wire the OpenAI-compatible services, the on-disk index and the agent.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let embedder = OpenAIEmbeddingProvider::new(&config.api_key)?
            .with_base_url(&config.base_url)
            .with_model(&config.embedding_model)
            .with_native_dimensions(config.embedding_dimensions)
            .with_batch_size(config.rag.embedding_batch_size);

        let pipeline = Arc::new(
            RagPipeline::builder()
                .config(config.rag.clone())
                .embedding_provider(Arc::new(embedder))
                .vector_store(Arc::new(FileVectorStore::new(&config.index_dir)))
                .build()?,
        );

        let model = OpenAIClient::new(config.chat())?;
        let agent = AnsweringAgentBuilder::new("ragdesk")
            .model(Arc::new(model))
            .tool(Arc::new(RetrieverTool::new(pipeline.clone())))
            .build()?;

        info!(
            model = %config.chat_model,
            embedding_model = %config.embedding_model,
            index_dir = %config.index_dir.display(),
            "application ready"
        );
        Ok(Self::new(pipeline, agent))
    }

    pub fn pipeline(&self) -> &Arc<RagPipeline> {
        &self.pipeline
    }

    pub fn agent(&self) -> &AnsweringAgent {
        &self.agent
    }

    /// Read files from disk and rebuild the index from them.
    pub async fn ingest_paths(&self, paths: &[PathBuf]) -> Reply {
        let mut inputs = Vec::with_capacity(paths.len());
        let mut unreadable = Vec::new();
        for path in paths {
            match IngestInput::from_path(path).await {
                Ok(input) => inputs.push(input),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot read file");
                    unreadable.push(IngestFailure { filename: path.display().to_string(), message: e.to_string() });
                }
            }
        }

        if inputs.is_empty() {
            return match unreadable.first() {
                None => Reply::Notice("Please select at least one PDF file.".to_string()),
                Some(_) => Reply::Error(
                    unreadable.iter().map(|f| f.message.as_str()).collect::<Vec<_>>().join("; "),
                ),
            };
        }

        match self.ingest(&inputs).await {
            Reply::Ingested(mut report) => {
                report.failures.extend(unreadable);
                Reply::Ingested(report)
            }
            other => other,
        }
    }

    /// Rebuild the index from uploaded files.
    pub async fn ingest(&self, inputs: &[IngestInput]) -> Reply {
        if inputs.is_empty() {
            return Reply::Notice("Please select at least one PDF file.".to_string());
        }
        match self.pipeline.ingest(inputs).await {
            Ok(report) => Reply::Ingested(report),
            Err(e) => {
                error!(error = %e, "ingestion failed");
                rag_error_reply(&e)
            }
        }
    }

    /// Check that a usable index exists, returning the reply to show if not.
    async fn require_index(&self) -> Option<Reply> {
        if !self.pipeline.is_ready().await {
            info!("question received before any documents were processed");
            return Some(Reply::Notice(NO_INDEX_MESSAGE.to_string()));
        }
        match self.pipeline.load().await {
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "index cannot be loaded");
                Some(rag_error_reply(&e))
            }
        }
    }

    /// Answer a question from the indexed documents.
    pub async fn ask(&self, question: &str) -> Reply {
        let question = question.trim();
        if question.is_empty() {
            return Reply::Notice("Please enter a question.".to_string());
        }
        if let Some(reply) = self.require_index().await {
            return reply;
        }
        match self.agent.answer(question).await {
            Ok(answer) => Reply::Answer(answer),
            Err(e) => {
                error!(error = %e, "agent failed");
                Reply::Error(format!("The assistant could not answer. {e}"))
            }
        }
    }

    /// Streaming form of [`ask`](Self::ask). Returns the reply to show
    /// instead when no answer can be attempted.
    pub async fn ask_stream<'a>(&'a self, question: &'a str) -> Result<AgentEventStream<'a>, Reply> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Reply::Notice("Please enter a question.".to_string()));
        }
        if let Some(reply) = self.require_index().await {
            return Err(reply);
        }
        Ok(self.agent.answer_stream(question))
    }

    /// Delete the index. The conversation is kept.
    pub async fn clear(&self) -> Reply {
        match self.pipeline.clear().await {
            Ok(()) => Reply::Notice("The document index has been cleared.".to_string()),
            Err(e) => {
                error!(error = %e, "clearing the index failed");
                Reply::Error(format!("Clearing failed. {e}"))
            }
        }
    }

    pub async fn status(&self) -> Reply {
        Reply::Status(self.pipeline.status().await)
    }

    /// Forget the conversation. The index is kept.
    pub async fn reset_conversation(&self) -> Reply {
        self.agent.clear_history().await;
        Reply::Notice("Conversation cleared.".to_string())
    }
}
