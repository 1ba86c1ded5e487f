//! Common types shared across the Trendscope crates.
//!
//! This crate holds the provider configuration enums, the shared error type,
//! and the observability helpers. It is intentionally lightweight so that
//! every crate in the workspace can depend on it.
//!
//! # Overview
//!
//! - [`LlmConfig`]: provider-agnostic text-generation configuration
//! - [`SearchConfig`]: provider-agnostic web search configuration
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`TrendError`] and [`Result`]: shared error handling
//!
//! # Examples
//!
//! ```rust
//! use trendscope_common::{SearchConfig, TrendError};
//!
//! let cfg: SearchConfig = serde_json::from_str(
//!     r#"{"provider":"brave","token":"demo"}"#,
//! ).unwrap();
//! assert!(matches!(cfg, SearchConfig::Brave { .. }));
//!
//! let err = TrendError::Config("missing api key".into());
//! assert_eq!(err.to_string(), "Configuration error: missing api key");
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Configuration for the text-generation provider.
///
/// Feature flags control which variants are compiled in.
/// See the `trendscope-llm` crate for the concrete clients.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LlmConfig {
    #[cfg(feature = "gemini")]
    Gemini {
        api_key: String,
        #[serde(default = "default_gemini_model")]
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
    #[cfg(feature = "openai")]
    #[serde(rename = "openai")]
    OpenAi {
        api_key: String,
        #[serde(default = "default_openai_model")]
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
    #[default]
    None,
}

#[allow(dead_code)]
fn default_gemini_model() -> String {
    "gemini-1.5-flash".into()
}

#[allow(dead_code)]
fn default_openai_model() -> String {
    "gpt-4o-mini".into()
}

/// Configuration for the web search provider.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum SearchConfig {
    /// Google Programmable Search (Custom Search JSON API).
    Google {
        api_key: String,
        engine_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
    /// Brave Search web API.
    Brave {
        token: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_url: Option<String>,
    },
    #[default]
    None,
}

/// Error types used across the Trendscope system.
#[derive(thiserror::Error, Debug)]
pub enum TrendError {
    /// A remote provider (search or text generation) failed.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Writing the report to disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for errors bubbled up from helper libraries.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),

    /// Operation exceeded its bounded timeout.
    #[error("Timeout occurred")]
    Timeout,
}

/// Convenient alias for results that use [`TrendError`].
pub type Result<T> = std::result::Result<T, TrendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_config_is_tagged_by_provider() {
        let cfg: SearchConfig = serde_json::from_str(
            r#"{"provider":"google","api_key":"k","engine_id":"cx-1"}"#,
        )
        .unwrap();
        match cfg {
            SearchConfig::Google {
                api_key,
                engine_id,
                base_url,
            } => {
                assert_eq!(api_key, "k");
                assert_eq!(engine_id, "cx-1");
                assert!(base_url.is_none());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn defaults_to_no_provider() {
        assert!(matches!(SearchConfig::default(), SearchConfig::None));
        assert!(matches!(LlmConfig::default(), LlmConfig::None));
    }
}
