//! Startup errors for the ragdesk application.

use ragdesk_agent::AgentError;
use ragdesk_model::ModelError;
use ragdesk_rag::RagError;
use thiserror::Error;

/// Failures while assembling a [`RagApp`](crate::app::RagApp).
///
/// Once the app is running, failures are reported as
/// [`Reply::Error`](crate::app::Reply::Error) instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Rag(#[from] RagError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Agent(#[from] AgentError),
}
