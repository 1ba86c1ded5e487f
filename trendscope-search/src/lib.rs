//! Web search providers behind one async trait.
//!
//! - [`GoogleSearch`]: Google Programmable Search
//! - [`BraveSearch`]: Brave Search web + news verticals
//!
//! Providers return [`RawHit`]s exactly as the API reported them; validation
//! belongs to the caller.
pub mod brave;
pub mod google;
pub mod types;

use async_trait::async_trait;
use std::sync::Arc;
use trendscope_common::{SearchConfig, TrendError};

pub use brave::BraveSearch;
pub use google::GoogleSearch;
pub use types::{RawHit, RecencyWindow, SearchError};

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Short stable name used in logs.
    fn name(&self) -> &'static str;

    /// Run one query. Zero hits is a valid answer.
    async fn search(
        &self,
        query: &str,
        window: RecencyWindow,
    ) -> Result<Vec<RawHit>, SearchError>;
}

/// Build the configured provider.
pub fn ensure_search_ready(
    config: &SearchConfig,
) -> trendscope_common::Result<Arc<dyn SearchProvider + Send + Sync + 'static>> {
    match config {
        SearchConfig::Google {
            api_key,
            engine_id,
            base_url,
        } => {
            let base = base_url.as_deref().unwrap_or(google::GOOGLE_BASE_URL);
            let client = GoogleSearch::with_base_url(api_key.clone(), engine_id.clone(), base)?;
            tracing::info!(provider = "google", "search.client.ready");
            Ok(Arc::new(client))
        }
        SearchConfig::Brave { token, base_url } => {
            let base = base_url.as_deref().unwrap_or(brave::BRAVE_BASE_URL);
            let client = BraveSearch::with_base_url(token, base)?;
            tracing::info!(provider = "brave", "search.client.ready");
            Ok(Arc::new(client))
        }
        SearchConfig::None => Err(TrendError::Config("No search provider configured".into())),
    }
}
