//! Google Programmable Search (Custom Search JSON API) client.
use crate::types::{RawHit, RecencyWindow, SearchError};
use crate::SearchProvider;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::time::Instant;
use trendscope_http::{Auth, HttpClient, RequestOpts};

pub const GOOGLE_BASE_URL: &str = "https://www.googleapis.com/";
const RESULTS_PER_QUERY: u8 = 10;
const PUBLISHED_META_KEYS: &[&str] = &[
    "article:published_time",
    "datePublished",
    "publishdate",
    "date",
];

#[derive(Debug, Deserialize, Default)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
    pagemap: Option<Pagemap>,
}

#[derive(Debug, Deserialize, Default)]
struct Pagemap {
    #[serde(default)]
    metatags: Vec<Map<String, Value>>,
    #[serde(default)]
    newsarticle: Vec<Map<String, Value>>,
}

impl Pagemap {
    fn published(&self) -> Option<String> {
        let from_meta = self.metatags.first().and_then(|tags| {
            PUBLISHED_META_KEYS
                .iter()
                .find_map(|k| tags.get(*k).and_then(Value::as_str))
        });
        let from_article = || {
            self.newsarticle
                .first()
                .and_then(|a| a.get("datepublished"))
                .and_then(Value::as_str)
        };
        from_meta.or_else(from_article).map(str::to_string)
    }
}

impl From<CseItem> for RawHit {
    fn from(item: CseItem) -> Self {
        let published = item.pagemap.as_ref().and_then(Pagemap::published);
        RawHit {
            title: item.title,
            link: item.link,
            snippet: item.snippet,
            published,
        }
    }
}

#[derive(Clone)]
pub struct GoogleSearch {
    http: HttpClient,
    api_key: String,
    engine_id: String,
}

impl GoogleSearch {
    pub fn new(api_key: String, engine_id: String) -> Result<Self, SearchError> {
        Self::with_base_url(api_key, engine_id, GOOGLE_BASE_URL)
    }

    pub fn with_base_url(
        api_key: String,
        engine_id: String,
        base_url: &str,
    ) -> Result<Self, SearchError> {
        if api_key.trim().is_empty() || engine_id.trim().is_empty() {
            return Err(SearchError::Config(
                "google search needs both api_key and engine_id".into(),
            ));
        }
        let http = HttpClient::new(base_url)?.with_retries(1);
        Ok(Self {
            http,
            api_key,
            engine_id,
        })
    }
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn search(
        &self,
        query: &str,
        window: RecencyWindow,
    ) -> Result<Vec<RawHit>, SearchError> {
        let started = Instant::now();
        let params: Vec<(&str, Cow<'_, str>)> = vec![
            ("cx", self.engine_id.as_str().into()),
            ("q", query.into()),
            ("num", RESULTS_PER_QUERY.to_string().into()),
            ("sort", "date".into()),
            ("dateRestrict", window.date_restrict().into()),
            ("gl", "us".into()),
            ("hl", "en".into()),
        ];
        let resp: CseResponse = self
            .http
            .get_json(
                "customsearch/v1",
                RequestOpts {
                    auth: Some(Auth::Query {
                        name: "key",
                        value: self.api_key.as_str().into(),
                    }),
                    query: Some(params),
                    ..Default::default()
                },
            )
            .await?;

        let hits: Vec<RawHit> = resp.items.into_iter().map(RawHit::from).collect();
        tracing::info!(
            target: "search.google",
            query = %query,
            hit_count = hits.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search.google.done"
        );
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn published_prefers_metatags_then_newsarticle() {
        let item: CseItem = serde_json::from_value(json!({
            "title": "T",
            "link": "https://a.io/x",
            "pagemap": {
                "metatags": [{"og:title": "T", "datePublished": "2025-01-02"}],
                "newsarticle": [{"datepublished": "2024-12-31"}]
            }
        }))
        .unwrap();
        assert_eq!(RawHit::from(item).published.as_deref(), Some("2025-01-02"));

        let item: CseItem = serde_json::from_value(json!({
            "title": "T",
            "pagemap": {"newsarticle": [{"datepublished": "2024-12-31"}]}
        }))
        .unwrap();
        assert_eq!(RawHit::from(item).published.as_deref(), Some("2024-12-31"));
    }

    #[test]
    fn rejects_blank_credentials() {
        assert!(matches!(
            GoogleSearch::new(" ".into(), "cx".into()),
            Err(SearchError::Config(_))
        ));
    }
}
