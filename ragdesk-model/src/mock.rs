//! Scripted model for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use ragdesk_core::{CoreError, Llm, LlmChunk, LlmRequest, LlmResponse, LlmResponseStream, Result};

/// A model that replays scripted responses in order.
///
/// Every request is recorded so tests can inspect what the agent sent.
/// Streaming splits text at spaces, so a streamed reply arrives in several
/// fragments whose concatenation equals the scripted text.
///
/// # Example
///
/// ```rust,ignore
/// use ragdesk_model::MockLlm;
///
/// let model = MockLlm::new("mock")
///     .with_tool_call("call_0", "pdf_extractor", json!({ "query": "pricing" }))
///     .with_response("The plan costs $10.");
/// ```
#[derive(Debug)]
pub struct MockLlm {
    name: String,
    script: Mutex<VecDeque<std::result::Result<LlmResponse, String>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), script: Mutex::new(VecDeque::new()), requests: Mutex::new(Vec::new()) }
    }

    /// Queue a final answer.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.push(Ok(LlmResponse::Final(text.into())))
    }

    /// Queue a single tool call.
    pub fn with_tool_call(
        self,
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        let call = ragdesk_core::ToolCall { id: id.into(), name: name.into(), arguments };
        self.push(Ok(LlmResponse::ToolCalls { text: String::new(), calls: vec![call] }))
    }

    /// Queue an arbitrary decision.
    pub fn with_decision(self, response: LlmResponse) -> Self {
        self.push(Ok(response))
    }

    /// Queue a service failure.
    pub fn with_error(self, message: impl Into<String>) -> Self {
        self.push(Err(message.into()))
    }

    fn push(self, entry: std::result::Result<LlmResponse, String>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(entry);
        }
        self
    }

    /// Number of generation requests received so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Copies of every request received so far.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn next(&self, request: LlmRequest) -> Result<LlmResponse> {
        let mut requests =
            self.requests.lock().map_err(|_| CoreError::Model("mock state poisoned".into()))?;
        requests.push(request);
        let mut script =
            self.script.lock().map_err(|_| CoreError::Model("mock state poisoned".into()))?;
        match script.pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(CoreError::Model(message)),
            None => Err(CoreError::Model(format!("{}: no scripted response left", self.name))),
        }
    }
}

fn fragments(text: &str) -> Vec<String> {
    text.split_inclusive(' ').map(str::to_string).collect()
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.next(request)
    }

    async fn generate_stream(&self, request: LlmRequest) -> Result<LlmResponseStream> {
        let mut chunks: Vec<Result<LlmChunk>> = Vec::new();
        match self.next(request)? {
            LlmResponse::Final(text) => {
                chunks.extend(fragments(&text).into_iter().map(|f| Ok(LlmChunk::Text(f))));
            }
            LlmResponse::ToolCalls { text, calls } => {
                chunks.extend(fragments(&text).into_iter().map(|f| Ok(LlmChunk::Text(f))));
                chunks.push(Ok(LlmChunk::ToolCalls(calls)));
            }
        }
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use ragdesk_core::{Message, collect_stream};
    use serde_json::json;

    #[tokio::test]
    async fn replays_script_and_records_requests() {
        let model = MockLlm::new("mock")
            .with_tool_call("call_0", "pdf_extractor", json!({ "query": "q" }))
            .with_response("done");

        let first = model.generate(LlmRequest::new(vec![Message::user("hi")])).await.unwrap();
        assert!(matches!(first, LlmResponse::ToolCalls { ref calls, .. } if calls[0].name == "pdf_extractor"));
        assert_eq!(model.generate(LlmRequest::default()).await.unwrap(), LlmResponse::Final("done".into()));
        assert!(model.generate(LlmRequest::default()).await.is_err());

        assert_eq!(model.call_count(), 3);
        assert_eq!(model.requests()[0].messages[0].content, "hi");
    }

    #[tokio::test]
    async fn streams_text_in_fragments() {
        let model = MockLlm::new("mock").with_response("one two three");
        let stream = model.generate_stream(LlmRequest::default()).await.unwrap();
        let chunks: Vec<_> = stream.collect().await;
        assert_eq!(chunks.len(), 3);

        let model = MockLlm::new("mock").with_response("one two three");
        let stream = model.generate_stream(LlmRequest::default()).await.unwrap();
        assert_eq!(collect_stream(stream).await.unwrap(), LlmResponse::Final("one two three".into()));
    }

    #[tokio::test]
    async fn scripted_error_is_a_model_error() {
        let model = MockLlm::new("mock").with_error("rate limited");
        let err = model.generate(LlmRequest::default()).await.unwrap_err();
        assert!(matches!(err, CoreError::Model(ref m) if m == "rate limited"));
    }
}
