//! # ragdesk-agent
//!
//! The answering agent: a bounded tool-calling loop over an [`Llm`](ragdesk_core::Llm)
//! with a fixed set of [`Tool`](ragdesk_core::Tool)s and a FIFO conversation
//! history.
//!
//! - [`AnsweringAgent::answer`] runs a turn to completion
//! - [`AnsweringAgent::answer_stream`] yields [`AgentEvent`]s as the turn progresses
//! - [`ConversationHistory`] keeps the most recent messages (50 by default)

pub mod agent;
pub mod error;
pub mod history;

pub use agent::{
    AgentEvent, AgentEventStream, AnsweringAgent, AnsweringAgentBuilder, Answer,
    DEFAULT_INSTRUCTION, DEFAULT_MAX_ITERATIONS, ToolResult,
};
pub use error::{AgentError, Result};
pub use history::{ConversationHistory, DEFAULT_HISTORY_CAPACITY};
