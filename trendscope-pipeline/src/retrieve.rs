//! Runs queries against the search provider, one at a time.
use std::sync::Arc;
use std::time::Duration;
use trendscope_search::{RecencyWindow, SearchProvider};

use crate::normalize::normalize;
use crate::types::{SearchQuery, SearchResult};

pub struct Retriever {
    provider: Arc<dyn SearchProvider + Send + Sync>,
    window: RecencyWindow,
    delay: Duration,
    timeout: Duration,
}

impl Retriever {
    pub fn new(
        provider: Arc<dyn SearchProvider + Send + Sync>,
        window: RecencyWindow,
        delay: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            window,
            delay,
            timeout,
        }
    }

    /// A query that fails or times out contributes nothing; the rest still
    /// run. Calls are spaced by the configured delay.
    pub async fn retrieve(&self, queries: &[SearchQuery]) -> Vec<SearchResult> {
        let mut results = Vec::new();
        for (i, query) in queries.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let hits = match tokio::time::timeout(
                self.timeout,
                self.provider.search(&query.text, self.window),
            )
            .await
            {
                Ok(Ok(hits)) => hits,
                Ok(Err(err)) => {
                    tracing::warn!(
                        provider = self.provider.name(),
                        query = %query.text,
                        error = %err,
                        "pipeline.retrieve.query.failed"
                    );
                    continue;
                }
                Err(_) => {
                    tracing::warn!(
                        provider = self.provider.name(),
                        query = %query.text,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "pipeline.retrieve.query.timeout"
                    );
                    continue;
                }
            };

            let received = hits.len();
            let before = results.len();
            for hit in hits {
                match normalize(hit, query) {
                    Ok(result) => results.push(result),
                    Err(rejection) => {
                        tracing::warn!(
                            query = %query.text,
                            %rejection,
                            "pipeline.retrieve.hit.rejected"
                        )
                    }
                }
            }
            tracing::debug!(
                query = %query.text,
                received,
                kept = results.len() - before,
                "pipeline.retrieve.query.done"
            );
        }
        tracing::info!(queries = queries.len(), results = results.len(), "pipeline.retrieve.done");
        results
    }
}
