//! Error types for ragdesk-agent.

use ragdesk_core::CoreError;
use thiserror::Error;

/// Errors that end an agent turn.
///
/// Tool failures are not among them: they are reported back to the model as
/// tool results so it can recover.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The agent was built with invalid settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// The generation service failed
    #[error("Model error: {0}")]
    Model(String),

    /// The model kept requesting tools without producing an answer
    #[error("No final answer after {0} model calls")]
    MaxIterations(usize),
}

impl From<CoreError> for AgentError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config(message) => AgentError::Config(message),
            CoreError::Model(message) | CoreError::Tool(message) => AgentError::Model(message),
        }
    }
}

/// Result type alias for AgentError
pub type Result<T> = std::result::Result<T, AgentError>;
