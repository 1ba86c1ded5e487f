//! Provider-agnostic text generation for Trendscope.
//!
//! This crate exposes the [`traits::LlmClient`] interface, concrete clients
//! for Gemini and OpenAI, and [`decode::lenient_decode`] for recovering
//! structured output from model text. [`ensure_llm_ready`] builds a client
//! from a [`trendscope_common::LlmConfig`].
//!
//! ```no_run
//! use trendscope_common::{LlmConfig, Result};
//! use trendscope_llm::ensure_llm_ready;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let cfg = LlmConfig::OpenAi {
//!     api_key: "sk-demo".into(),
//!     model: "gpt-4o-mini".into(),
//!     base_url: None,
//! };
//! let client = ensure_llm_ready(&cfg).await?;
//! assert_eq!(client.model_name(), "gpt-4o-mini");
//! # Ok(())
//! # }
//! ```
pub mod decode;
#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "openai")]
pub mod openai;
pub mod traits;

use std::sync::Arc;
use traits::LlmClient;
use trendscope_common::{LlmConfig, TrendError};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Build a client for the configured provider.
pub async fn ensure_llm_ready(
    config: &LlmConfig,
) -> trendscope_common::Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    match config {
        #[cfg(feature = "gemini")]
        LlmConfig::Gemini {
            api_key,
            model,
            base_url,
        } => {
            let base = base_url.as_deref().unwrap_or(gemini::GEMINI_BASE_URL);
            let client = gemini::GeminiClient::with_base_url(api_key.clone(), model.clone(), base)?;
            tracing::info!(provider = "gemini", model = %model, "llm.client.ready");
            Ok(Arc::new(client))
        }
        #[cfg(feature = "openai")]
        LlmConfig::OpenAi {
            api_key,
            model,
            base_url,
        } => {
            let base = base_url.as_deref().unwrap_or(openai::OPENAI_API_BASE);
            let client = openai::OpenAiClient::with_base_url(api_key.clone(), model.clone(), base)?;
            tracing::info!(provider = "openai", model = %model, "llm.client.ready");
            Ok(Arc::new(client))
        }
        LlmConfig::None => Err(TrendError::Config("No LLM configured".to_string())),
    }
}
