//! # ragdesk-core
//!
//! Shared contracts for the ragdesk workspace.
//!
//! - [`Message`] / [`Role`] / [`ToolCall`] - the chat transcript exchanged with a model
//! - [`Llm`] - a generation service that either answers or asks for tool calls
//! - [`Tool`] - a named, described capability the answering agent may invoke
//!
//! Concrete models live in `ragdesk-model`, the retrieval tool in `ragdesk-rag`
//! and the agent loop in `ragdesk-agent`.

pub mod error;
pub mod message;
pub mod model;
pub mod tool;

pub use error::{CoreError, Result};
pub use message::{Message, Role, ToolCall};
pub use model::{
    Llm, LlmChunk, LlmRequest, LlmResponse, LlmResponseStream, ToolDeclaration, collect_stream,
};
pub use tool::{Tool, ToolOutput};
