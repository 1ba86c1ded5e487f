//! Initial query plan: model-written queries, the fixed set, and queries
//! aimed at curated sources.
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use trendscope_config::PipelineSettings;
use trendscope_llm::decode::lenient_decode;
use trendscope_llm::traits::LlmClient;

use crate::types::{DateRange, SearchQuery};

pub struct QueryPlanner {
    llm: Arc<dyn LlmClient + Send + Sync>,
    settings: Arc<PipelineSettings>,
}

impl QueryPlanner {
    pub fn new(llm: Arc<dyn LlmClient + Send + Sync>, settings: Arc<PipelineSettings>) -> Self {
        Self { llm, settings }
    }

    pub async fn initial_queries(&self, range: &DateRange) -> Vec<SearchQuery> {
        let generated = match self.generate(range).await {
            Some(queries) => queries,
            None => fallback_queries(range.end),
        };

        let mut plan: Vec<SearchQuery> = generated.into_iter().map(SearchQuery::general).collect();
        plan.extend(self.settings.fixed_queries.iter().cloned().map(SearchQuery::general));
        plan.extend(self.curated_queries());
        let plan = dedup_queries(plan);

        tracing::info!(
            total = plan.len(),
            targeted = plan.iter().filter(|q| q.targeted_source.is_some()).count(),
            "pipeline.queries.planned"
        );
        plan
    }

    /// One query per curated term, suffixed by the kind of source.
    pub fn curated_queries(&self) -> Vec<SearchQuery> {
        let per_source = self.settings.sources.terms_per_source;
        self.settings
            .sources
            .curated_sources
            .iter()
            .flat_map(|source| {
                source.terms.iter().take(per_source).map(move |term| {
                    SearchQuery::targeted(
                        format!("{term} {}", source.kind.query_suffix()),
                        source.domain.clone(),
                    )
                })
            })
            .collect()
    }

    async fn generate(&self, range: &DateRange) -> Option<Vec<String>> {
        let want = self.settings.generated_query_count;
        let prompt = query_prompt(range, want);
        let timeout = Duration::from_secs(self.settings.generation_timeout_secs);

        let call = self.llm.analyze(&prompt, 1024, 0.7);
        let response = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "pipeline.queries.generate.failed");
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "pipeline.queries.generate.timeout"
                );
                return None;
            }
        };

        let queries: Vec<String> = match lenient_decode::<Vec<String>>(&response.text) {
            Ok(queries) => queries
                .into_iter()
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .collect(),
            Err(err) => {
                tracing::warn!(error = %err, "pipeline.queries.generate.undecodable");
                return None;
            }
        };
        if queries.len() != want {
            tracing::warn!(
                expected = want,
                got = queries.len(),
                "pipeline.queries.generate.wrong_count"
            );
            return None;
        }
        Some(queries)
    }
}

/// Month-stamped queries used when the model cannot be asked or answers
/// with something unusable.
pub fn fallback_queries(now: DateTime<Local>) -> Vec<String> {
    let month = now.format("%B %Y").to_string();
    let recent = format!("past 2 weeks {month}");
    vec![
        format!("AI announcements {recent} article"),
        format!("artificial intelligence news latest {month} story"),
        "AI breakthroughs past 2 weeks report".to_string(),
        format!("OpenAI Google Microsoft AI updates {month} announcement"),
        "Anthropic Meta AI developments recent news".to_string(),
        format!("AI startups launches {recent} coverage"),
        "AI developer tools released past 2 weeks announcement".to_string(),
        format!("new AI APIs SDKs {month} launch"),
        "AI coding assistants updates recent release".to_string(),
        format!("AI model releases {recent} announcement"),
        format!("machine learning breakthroughs {month} research"),
        "AI capabilities improvements recent development".to_string(),
        format!("AI partnerships announcements {recent} news"),
        format!("AI funding investment news {month} report"),
        format!("enterprise AI adoption {recent} case study"),
    ]
}

fn dedup_queries(queries: Vec<SearchQuery>) -> Vec<SearchQuery> {
    let mut seen = HashSet::new();
    queries
        .into_iter()
        .filter(|q| seen.insert(q.text.to_lowercase()))
        .collect()
}

fn query_prompt(range: &DateRange, count: usize) -> String {
    format!(
        r#"Write web search queries that surface the most important AI developments of {range}.

Cover:
- what companies launched, released or announced
- tools, APIs, SDKs and framework updates that matter to developers
- partnerships, funding and other industry shifts

Rules:
- 3 to 8 words per query
- use verbs such as "launches", "releases", "announces", "introduces"
- add time markers such as "past 2 weeks" or "{month}"
- name companies when it helps, but keep most queries broad
- no site: filters

Return EXACTLY {count} queries as a JSON array of strings, highest priority first."#,
        range = range.label(),
        month = range.end.format("%B %Y"),
    )
}
