//! # ragdesk-model
//!
//! Chat model integrations for ragdesk.
//!
//! ## Overview
//!
//! - [`OpenAIClient`] - any OpenAI-compatible chat completions API (OpenAI,
//!   DashScope compatible mode, vLLM, Ollama, etc.)
//! - [`MockLlm`] - scripted model for tests and offline runs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ragdesk_model::openai::{OpenAIClient, OpenAIConfig};
//!
//! let model = OpenAIClient::new(OpenAIConfig::dashscope(
//!     std::env::var("DASHSCOPE_API_KEY").unwrap(),
//!     "qwen-plus",
//! ))?;
//! ```
//!
//! ## Features
//!
//! - `openai` (default) - the reqwest-based OpenAI-compatible client
//! - Streaming with incremental tool-call assembly
//! - Tool/function calling

pub mod error;
pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;

pub use error::{ModelError, Result};
pub use mock::MockLlm;
#[cfg(feature = "openai")]
pub use openai::{OpenAIClient, OpenAIConfig};
