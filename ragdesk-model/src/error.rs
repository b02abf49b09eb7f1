//! Error types for ragdesk-model.

use ragdesk_core::CoreError;
use thiserror::Error;

/// Errors that can occur when talking to a chat model service.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The request could not be built from the transcript
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The request never reached the service or the connection dropped
    #[error("Request failed: {0}")]
    Transport(String),

    /// The service rejected the request
    #[error("API error: {0}")]
    Api(String),

    /// The service answered with something we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[cfg(feature = "openai")]
impl From<async_openai::error::OpenAIError> for ModelError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        use async_openai::error::OpenAIError;

        match err {
            OpenAIError::ApiError(api) => ModelError::Api(api.message),
            OpenAIError::Reqwest(e) => ModelError::Transport(e.to_string()),
            OpenAIError::StreamError(e) => ModelError::Transport(format!("stream interrupted: {e}")),
            OpenAIError::JSONDeserialize(e) => ModelError::InvalidResponse(e.to_string()),
            OpenAIError::InvalidArgument(e) => ModelError::InvalidRequest(e),
            other => ModelError::InvalidResponse(other.to_string()),
        }
    }
}

impl From<ModelError> for CoreError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidConfig(message) => CoreError::Config(message),
            other => CoreError::Model(other.to_string()),
        }
    }
}

/// Result type alias for ModelError
pub type Result<T> = std::result::Result<T, ModelError>;
