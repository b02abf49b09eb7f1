//! Configuration for OpenAI-compatible chat services.

use std::time::Duration;

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// DashScope's OpenAI-compatible endpoint.
pub const DASHSCOPE_API_BASE: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

/// Connection settings and generation defaults for an [`OpenAIClient`](super::OpenAIClient).
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
    /// API base URL, without the `/chat/completions` suffix or a trailing slash.
    pub base_url: String,
    /// Default sampling temperature, used when a request does not set one.
    pub temperature: Option<f32>,
    /// Default completion token limit, used when a request does not set one.
    pub max_tokens: Option<u32>,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
}

impl OpenAIConfig {
    /// Configuration for the OpenAI API.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::compatible(api_key, OPENAI_API_BASE, model)
    }

    /// Configuration for any OpenAI-compatible service.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            temperature: None,
            max_tokens: None,
            timeout: None,
        }
    }

    /// Configuration for DashScope in compatible mode.
    pub fn dashscope(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::compatible(api_key, DASHSCOPE_API_BASE, model)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatible_trims_trailing_slash() {
        let config = OpenAIConfig::compatible("key", "http://localhost:8000/v1/", "m");
        assert_eq!(config.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn dashscope_uses_compatible_mode_endpoint() {
        let config = OpenAIConfig::dashscope("key", "qwen-plus").with_temperature(0.0);
        assert_eq!(config.base_url, "https://dashscope.aliyuncs.com/compatible-mode/v1");
        assert_eq!(config.temperature, Some(0.0));
    }
}
