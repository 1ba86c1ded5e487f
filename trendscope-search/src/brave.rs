//! Brave Search web API client.
use crate::types::{RawHit, RecencyWindow, SearchError};
use crate::SearchProvider;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use serde::Deserialize;
use std::borrow::Cow;
use std::time::Instant;
use trendscope_http::{Auth, HttpClient, HttpError, RequestOpts};

pub const BRAVE_BASE_URL: &str = "https://api.search.brave.com/";
const RESULTS_PER_QUERY: u8 = 20;

#[derive(Debug, Deserialize, Default)]
struct WebSearchApiResponse {
    web: Option<Vertical>,
    news: Option<Vertical>,
}

#[derive(Debug, Deserialize, Default)]
struct Vertical {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize, Clone)]
struct BraveResult {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    page_age: Option<String>,
    age: Option<String>,
    #[serde(default)]
    cluster: Vec<BraveResult>,
}

impl BraveResult {
    fn into_hit(self) -> RawHit {
        RawHit {
            title: self.title,
            link: self.url,
            snippet: self.description.map(|d| strip_markup(&d)),
            published: self.page_age.or(self.age),
        }
    }
}

/// Brave wraps matched terms in `<strong>`; keep the plain text.
fn strip_markup(s: &str) -> String {
    s.replace("<strong>", "").replace("</strong>", "")
}

fn collect_hits(resp: WebSearchApiResponse) -> Vec<RawHit> {
    let verticals = [resp.web, resp.news];
    let mut out = Vec::new();
    for vertical in verticals.into_iter().flatten() {
        for mut result in vertical.results {
            let cluster = std::mem::take(&mut result.cluster);
            out.push(result.into_hit());
            out.extend(cluster.into_iter().map(BraveResult::into_hit));
        }
    }
    out
}

#[derive(Clone)]
pub struct BraveSearch {
    http: HttpClient,
    token: HeaderValue,
}

impl BraveSearch {
    pub fn new(subscription_token: &str) -> Result<Self, SearchError> {
        Self::with_base_url(subscription_token, BRAVE_BASE_URL)
    }

    pub fn with_base_url(subscription_token: &str, base_url: &str) -> Result<Self, SearchError> {
        let mut token = HeaderValue::from_str(subscription_token.trim())
            .map_err(|e| SearchError::Http(HttpError::Build(e.to_string())))?;
        token.set_sensitive(true);
        let http = HttpClient::new(base_url)?.with_retries(1);
        Ok(Self { http, token })
    }
}

#[async_trait]
impl SearchProvider for BraveSearch {
    fn name(&self) -> &'static str {
        "brave"
    }

    async fn search(
        &self,
        query: &str,
        window: RecencyWindow,
    ) -> Result<Vec<RawHit>, SearchError> {
        let started = Instant::now();
        let params: Vec<(&str, Cow<'_, str>)> = vec![
            ("q", query.into()),
            ("count", RESULTS_PER_QUERY.to_string().into()),
            ("freshness", window.freshness().into()),
            ("safesearch", "moderate".into()),
            ("result_filter", "web,news".into()),
        ];
        let resp: WebSearchApiResponse = self
            .http
            .get_json(
                "res/v1/web/search",
                RequestOpts {
                    auth: Some(Auth::Header {
                        name: HeaderName::from_static("x-subscription-token"),
                        value: self.token.clone(),
                    }),
                    query: Some(params),
                    ..Default::default()
                },
            )
            .await?;

        let hits = collect_hits(resp);
        tracing::info!(
            target: "search.brave",
            query = %query,
            hit_count = hits.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search.brave.done"
        );
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_clusters_and_news() {
        let resp: WebSearchApiResponse = serde_json::from_value(json!({
            "web": {"results": [{
                "title": "Main",
                "url": "https://a.io/main",
                "description": "a <strong>new</strong> model",
                "page_age": "2025-03-01T10:00:00",
                "cluster": [{"title": "Sub", "url": "https://a.io/sub"}]
            }]},
            "news": {"results": [{"title": "News", "url": "https://b.io/n", "age": "2 days ago"}]}
        }))
        .unwrap();
        let hits = collect_hits(resp);
        let titles: Vec<_> = hits.iter().filter_map(|h| h.title.as_deref()).collect();
        assert_eq!(titles, vec!["Main", "Sub", "News"]);
        assert_eq!(hits[0].snippet.as_deref(), Some("a new model"));
        assert_eq!(hits[2].published.as_deref(), Some("2 days ago"));
    }
}
