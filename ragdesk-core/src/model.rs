//! The generation service contract.
//!
//! A model receives the transcript plus the tools it may call and replies with
//! a tagged decision: either it wants tools invoked ([`LlmResponse::ToolCalls`])
//! or it is done ([`LlmResponse::Final`]). Streaming models deliver the same
//! decision as a sequence of [`LlmChunk`]s.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::message::{Message, ToolCall};

/// A tool as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    /// JSON schema of the tool arguments.
    pub parameters: Value,
}

/// A single generation request.
#[derive(Debug, Clone, Default)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDeclaration>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages, ..Default::default() }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// The model's decision for one step of a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmResponse {
    /// The model asks for tools to be run before it continues.
    ///
    /// `text` holds any content the model emitted alongside the calls
    /// (usually empty).
    ToolCalls { text: String, calls: Vec<ToolCall> },
    /// The model produced its answer.
    Final(String),
}

/// One increment of a streamed [`LlmResponse`].
#[derive(Debug, Clone, PartialEq)]
pub enum LlmChunk {
    /// A fragment of generated text.
    Text(String),
    /// Fully assembled tool calls, delivered once at the end of the step.
    ToolCalls(Vec<ToolCall>),
}

/// A lazy, finite stream of response chunks.
pub type LlmResponseStream = Pin<Box<dyn Stream<Item = Result<LlmChunk>> + Send>>;

/// A text generation service.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Model identifier, used in logs.
    fn name(&self) -> &str;

    /// Run one generation step to completion.
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;

    /// Run one generation step, delivering text as it is produced.
    ///
    /// The default implementation wraps [`generate`](Llm::generate) in a
    /// single-chunk stream. Collecting the stream with [`collect_stream`]
    /// must yield what `generate` would have returned.
    async fn generate_stream(&self, request: LlmRequest) -> Result<LlmResponseStream> {
        let chunks = match self.generate(request).await? {
            LlmResponse::Final(text) => vec![Ok(LlmChunk::Text(text))],
            LlmResponse::ToolCalls { text, calls } => {
                let mut chunks = Vec::with_capacity(2);
                if !text.is_empty() {
                    chunks.push(Ok(LlmChunk::Text(text)));
                }
                chunks.push(Ok(LlmChunk::ToolCalls(calls)));
                chunks
            }
        };
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

/// Drain a response stream into the equivalent [`LlmResponse`].
pub async fn collect_stream(mut stream: LlmResponseStream) -> Result<LlmResponse> {
    let mut text = String::new();
    let mut calls = Vec::new();
    while let Some(chunk) = stream.next().await {
        match chunk? {
            LlmChunk::Text(fragment) => text.push_str(&fragment),
            LlmChunk::ToolCalls(more) => calls.extend(more),
        }
    }
    if calls.is_empty() { Ok(LlmResponse::Final(text)) } else { Ok(LlmResponse::ToolCalls { text, calls }) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixed(LlmResponse);

    #[async_trait]
    impl Llm for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn default_stream_collects_to_final_answer() {
        let model = Fixed(LlmResponse::Final("forty-two".into()));
        let stream = model.generate_stream(LlmRequest::default()).await.unwrap();
        assert_eq!(collect_stream(stream).await.unwrap(), LlmResponse::Final("forty-two".into()));
    }

    #[tokio::test]
    async fn default_stream_collects_tool_calls() {
        let response = LlmResponse::ToolCalls {
            text: String::new(),
            calls: vec![ToolCall {
                id: "call_0".into(),
                name: "pdf_extractor".into(),
                arguments: json!({ "query": "pricing" }),
            }],
        };
        let model = Fixed(response.clone());
        let stream = model.generate_stream(LlmRequest::default()).await.unwrap();
        assert_eq!(collect_stream(stream).await.unwrap(), response);
    }
}
