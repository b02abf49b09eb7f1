//! OpenAI-compatible chat completions client.
//!
//! This module talks to any service implementing the OpenAI
//! `/chat/completions` API, including:
//! - OpenAI itself
//! - Alibaba DashScope in compatible mode (`qwen-plus`, `qwen-max`, ...)
//! - Self-hosted servers such as vLLM or Ollama
//!
//! # Features
//!
//! - **Tool Calling**: declarations are sent as `function` tools and the
//!   model's calls come back as [`ToolCall`](ragdesk_core::ToolCall)s
//! - **Streaming**: built on `async-openai`'s chat stream; tool-call
//!   fragments are assembled and delivered once the step completes
//!
//! # Example
//!
//! ```rust,ignore
//! use ragdesk_model::openai::{OpenAIClient, OpenAIConfig};
//!
//! let model = OpenAIClient::new(
//!     OpenAIConfig::compatible("api-key", "http://localhost:8000/v1", "qwen2.5-7b")
//!         .with_temperature(0.0),
//! )?;
//! ```

mod client;
mod config;
mod convert;

pub use client::OpenAIClient;
pub use config::{DASHSCOPE_API_BASE, OPENAI_API_BASE, OpenAIConfig};
