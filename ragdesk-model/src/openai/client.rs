//! OpenAI-compatible client implementation.

use async_openai::{
    Client,
    config::OpenAIConfig as AsyncOpenAIConfig,
    types::{CreateChatCompletionRequest, CreateChatCompletionRequestArgs},
};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use ragdesk_core::{CoreError, Llm, LlmChunk, LlmRequest, LlmResponse, LlmResponseStream};
use tracing::{debug, error};

use super::config::OpenAIConfig;
use super::convert::{self, ToolCallAccumulator};
use crate::error::ModelError;

/// Client for OpenAI and OpenAI-compatible chat completion APIs.
pub struct OpenAIClient {
    client: Client<AsyncOpenAIConfig>,
    config: OpenAIConfig,
}

impl OpenAIClient {
    /// Create a new client.
    pub fn new(config: OpenAIConfig) -> Result<Self, ModelError> {
        if config.api_key.trim().is_empty() {
            return Err(ModelError::InvalidConfig("API key must not be empty".into()));
        }
        if config.model.trim().is_empty() {
            return Err(ModelError::InvalidConfig("model name must not be empty".into()));
        }

        let openai_config =
            AsyncOpenAIConfig::new().with_api_key(&config.api_key).with_api_base(&config.base_url);
        let mut client = Client::with_config(openai_config);

        if let Some(timeout) = config.timeout {
            let http = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
                ModelError::InvalidConfig(format!("failed to build HTTP client: {e}"))
            })?;
            client = client.with_http_client(http);
        }

        Ok(Self { client, config })
    }

    /// Create a client for an OpenAI-compatible API.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ModelError> {
        Self::new(OpenAIConfig::compatible(api_key, base_url, model))
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Build a chat request; request settings win over config defaults.
    fn build_request(&self, request: &LlmRequest) -> Result<CreateChatCompletionRequest, ModelError> {
        let messages = request
            .messages
            .iter()
            .map(convert::message_to_request)
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.config.model).messages(messages);

        if !request.tools.is_empty() {
            builder.tools(convert::convert_tools(&request.tools)?);
        }
        if let Some(temperature) = request.temperature.or(self.config.temperature) {
            builder.temperature(temperature);
        }
        if let Some(max_tokens) = request.max_tokens.or(self.config.max_tokens) {
            builder.max_tokens(max_tokens);
        }

        debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "building chat request"
        );
        Ok(builder.build()?)
    }
}

#[async_trait]
impl Llm for OpenAIClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, request: LlmRequest) -> ragdesk_core::Result<LlmResponse> {
        let openai_request = self.build_request(&request)?;
        let response = self.client.chat().create(openai_request).await.map_err(|e| {
            error!(model = %self.config.model, error = %e, "chat request failed");
            ModelError::from(e)
        })?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("response has no choices".into()))?;
        Ok(convert::from_response_message(choice.message)?)
    }

    async fn generate_stream(&self, request: LlmRequest) -> ragdesk_core::Result<LlmResponseStream> {
        let openai_request = self.build_request(&request)?;
        let mut chunks = self.client.chat().create_stream(openai_request).await.map_err(|e| {
            error!(model = %self.config.model, error = %e, "chat stream failed to start");
            ModelError::from(e)
        })?;
        let model = self.config.model.clone();

        let stream = try_stream! {
            let mut calls = ToolCallAccumulator::default();

            while let Some(chunk) = chunks.next().await {
                let chunk = chunk.map_err(|e| CoreError::from(ModelError::from(e)))?;
                if let Some(text) = convert::apply_chunk(chunk, &mut calls) {
                    yield LlmChunk::Text(text);
                }
            }

            if !calls.is_empty() {
                let assembled = calls.finish().map_err(CoreError::from)?;
                debug!(model = %model, count = assembled.len(), "tool calls assembled from stream");
                yield LlmChunk::ToolCalls(assembled);
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdesk_core::{Message, ToolDeclaration};
    use serde_json::json;

    #[test]
    fn rejects_empty_api_key() {
        let err = OpenAIClient::compatible("", "http://localhost", "m").err().unwrap();
        assert!(matches!(err, ModelError::InvalidConfig(_)));
        assert!(matches!(CoreError::from(err), CoreError::Config(_)));
    }

    #[test]
    fn request_merges_config_defaults() {
        let client = OpenAIClient::new(
            OpenAIConfig::compatible("key", "http://localhost/v1", "qwen-plus")
                .with_temperature(0.2)
                .with_max_tokens(256),
        )
        .unwrap();

        let request = LlmRequest::new(vec![Message::system("sys"), Message::user("hi")])
            .with_tools(vec![ToolDeclaration {
                name: "pdf_extractor".into(),
                description: "lookup".into(),
                parameters: json!({ "type": "object" }),
            }])
            .with_temperature(0.0);

        let body = serde_json::to_value(client.build_request(&request).unwrap()).unwrap();
        assert_eq!(body["model"], json!("qwen-plus"));
        assert_eq!(body["temperature"], json!(0.0));
        assert_eq!(body["max_tokens"], json!(256));
        assert_eq!(body["messages"][1]["role"], json!("user"));
        assert_eq!(body["messages"][1]["content"], json!("hi"));
        assert_eq!(body["tools"][0]["function"]["name"], json!("pdf_extractor"));
    }

    #[test]
    fn request_omits_empty_tools() {
        let client = OpenAIClient::compatible("key", "http://localhost/v1", "m").unwrap();
        let body = serde_json::to_value(client.build_request(&LlmRequest::default()).unwrap()).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("temperature").is_none());
    }
}
