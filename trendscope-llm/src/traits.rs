use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use trendscope_common::{Result, TrendError};
use trendscope_http::HttpError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Content blocked by provider: {0}")]
    Blocked(String),

    #[error("Empty response: {0}")]
    Empty(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<LlmError> for TrendError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Config(msg) => TrendError::Config(msg),
            other => TrendError::Provider(other.to_string()),
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response to the given prompt with optional system prompt
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse>;

    /// Check if the service is reachable and the key is accepted
    async fn health_check(&self) -> Result<bool>;

    fn model_name(&self) -> &str;

    fn default_analyst_system_prompt(&self) -> &str {
        r#"You are a technology analyst who tracks fast-moving developments in AI
and developer tooling.

Your role:
- Identify genuine patterns that are reported by several independent sources
- Cite only the exact URLs you were given, never a homepage or a guess
- Prefer concrete releases, APIs, benchmarks and datasets over opinion
- Be precise and concise

When asked for JSON, reply with JSON only."#
    }

    /// Generate with the analyst system prompt.
    async fn analyze(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<LlmResponse> {
        let system = self.default_analyst_system_prompt().to_string();
        tracing::debug!(
            model = self.model_name(),
            prompt_len = prompt.len(),
            max_tokens,
            "llm.analyze.start"
        );
        let response = self
            .generate(prompt, Some(&system), Some(max_tokens), Some(temperature))
            .await?;
        tracing::debug!(
            model = self.model_name(),
            text_len = response.text.len(),
            tokens_used = ?response.tokens_used,
            "llm.analyze.done"
        );
        Ok(response)
    }
}
