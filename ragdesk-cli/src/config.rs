//! Application configuration from the environment and command line.

use std::path::PathBuf;

use ragdesk_model::openai::{DASHSCOPE_API_BASE, OpenAIConfig};
use ragdesk_rag::{RagConfig, RagError, Result};
use tracing::debug;

pub const DEFAULT_CHAT_MODEL: &str = "deepseek-v3";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-v1";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;
pub const DEFAULT_INDEX_DIR: &str = "vector_db";

const API_KEY_VARS: [&str; 3] = ["RAGDESK_API_KEY", "DASHSCOPE_API_KEY", "LLM_API_KEY"];
const BASE_URL_VARS: [&str; 2] = ["RAGDESK_BASE_URL", "BASE_URL"];
const MODEL_VARS: [&str; 2] = ["RAGDESK_MODEL", "MODEL"];

/// Everything needed to assemble a [`RagApp`](crate::app::RagApp).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub index_dir: PathBuf,
    pub temperature: f32,
    pub rag: RagConfig,
}

/// Values given on the command line; each one wins over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub chat_model: Option<String>,
    pub embedding_model: Option<String>,
    pub index_dir: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
    pub top_k: Option<usize>,
}

impl AppConfig {
    /// Load `.env` (if present), then read the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if no API key is set or a value is
    /// invalid.
    pub fn from_env(overrides: Overrides) -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok(), overrides)
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, overrides: Overrides) -> Result<Self> {
        let first = |keys: &[&str]| {
            keys.iter().filter_map(|k| lookup(k)).find(|v| !v.trim().is_empty())
        };

        let api_key = overrides.api_key.or_else(|| first(&API_KEY_VARS)).ok_or_else(|| {
            RagError::ConfigError(format!("no API key set; export one of {}", API_KEY_VARS.join(", ")))
        })?;

        let embedding_dimensions = match lookup("RAGDESK_EMBEDDING_DIMENSIONS") {
            Some(raw) => raw.trim().parse::<usize>().ok().filter(|d| *d > 0).ok_or_else(|| {
                RagError::ConfigError(format!("RAGDESK_EMBEDDING_DIMENSIONS is not a positive integer: {raw}"))
            })?,
            None => DEFAULT_EMBEDDING_DIMENSIONS,
        };

        let defaults = RagConfig::default();
        let rag = RagConfig::builder()
            .chunk_size(overrides.chunk_size.unwrap_or(defaults.chunk_size))
            .chunk_overlap(overrides.chunk_overlap.unwrap_or(defaults.chunk_overlap))
            .top_k(overrides.top_k.unwrap_or(defaults.top_k))
            .build()?;

        Ok(Self {
            api_key,
            base_url: overrides
                .base_url
                .or_else(|| first(&BASE_URL_VARS))
                .unwrap_or_else(|| DASHSCOPE_API_BASE.to_string()),
            chat_model: overrides
                .chat_model
                .or_else(|| first(&MODEL_VARS))
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            embedding_model: overrides
                .embedding_model
                .or_else(|| first(&["RAGDESK_EMBEDDING_MODEL"]))
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_dimensions,
            index_dir: overrides
                .index_dir
                .or_else(|| first(&["RAGDESK_INDEX_DIR"]).map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INDEX_DIR)),
            temperature: 0.0,
            rag,
        })
    }

    /// Chat client settings.
    pub fn chat(&self) -> OpenAIConfig {
        OpenAIConfig::compatible(&self.api_key, &self.base_url, &self.chat_model)
            .with_temperature(self.temperature)
    }
}
