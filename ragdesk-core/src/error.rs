//! Error types shared across ragdesk crates.

use thiserror::Error;

/// Errors crossing the [`Llm`](crate::Llm) and [`Tool`](crate::Tool) seams.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The generation service failed (network, auth, rate limit, malformed reply).
    #[error("Model error: {0}")]
    Model(String),

    /// A tool failed to execute.
    #[error("Tool error: {0}")]
    Tool(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
