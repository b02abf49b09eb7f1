//! Retrieval tool for the answering agent.
//!
//! The [`RetrieverTool`] wraps a [`RagPipeline`] as a [`ragdesk_core::Tool`]
//! so that the agent can look up document context as a tool call.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragdesk_rag::{RagPipeline, RetrieverTool};
//!
//! let pipeline = Arc::new(build_pipeline()?);
//! let tool = RetrieverTool::new(pipeline);
//!
//! // The agent calls the tool with:
//! // { "query": "What does chapter 2 cover?" }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use ragdesk_core::{CoreError, Tool, ToolOutput};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::pipeline::RagPipeline;

/// Default tool name advertised to the model.
pub const DEFAULT_TOOL_NAME: &str = "pdf_extractor";

/// Default tool description advertised to the model.
pub const DEFAULT_TOOL_DESCRIPTION: &str =
    "Answers queries from the content of the uploaded PDF documents";

/// Separator placed between retrieved passages.
const PASSAGE_SEPARATOR: &str = "\n\n";

/// A read-only retrieval tool over a [`RagPipeline`].
///
/// Accepts a required `query` string, retrieves the pipeline's `top_k` most
/// similar chunks and returns their text joined by blank lines. The ids of the
/// returned chunks are reported as sources.
pub struct RetrieverTool {
    pipeline: Arc<RagPipeline>,
    name: String,
    description: String,
}

impl RetrieverTool {
    /// Create a tool with the default name and description.
    pub fn new(pipeline: Arc<RagPipeline>) -> Self {
        Self {
            pipeline,
            name: DEFAULT_TOOL_NAME.to_string(),
            description: DEFAULT_TOOL_DESCRIPTION.to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[async_trait]
impl Tool for RetrieverTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The question or search phrase to look up in the documents"
                }
            },
            "required": ["query"]
        }))
    }

    async fn execute(&self, args: Value) -> ragdesk_core::Result<ToolOutput> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::Tool("missing required 'query' parameter".into()))?;

        info!(tool = %self.name, query, "retriever tool called");

        let results = self.pipeline.query(query).await.map_err(|e| {
            error!(error = %e, "retrieval failed");
            CoreError::Tool(format!("retrieval failed: {e}"))
        })?;

        let content = results
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(PASSAGE_SEPARATOR);
        let sources = results.into_iter().map(|r| r.chunk.id).collect();
        Ok(ToolOutput { content, sources })
    }
}
