//! Groups the ranked pool into trend clusters.
//!
//! The model proposes clusters and cites URLs. Every citation is checked
//! against the pool: only exact URLs of non-poor pool members survive, and a
//! cluster left without evidence is dropped. When the model is unavailable
//! or nothing survives, clusters are built directly from the pool.
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use trendscope_llm::decode::lenient_decode;
use trendscope_llm::traits::LlmClient;

use crate::types::{DateRange, EvidenceStrength, ScoredResult, TrendCluster, UrlQuality};

pub const MAX_CLUSTERS: usize = 7;
pub const MAX_EVIDENCE: usize = 5;
pub const MAX_FALLBACK_CLUSTERS: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct Synthesis {
    pub clusters: Vec<TrendCluster>,
    pub used_fallback: bool,
    pub rejected_citations: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnalysisWire {
    Wrapped {
        #[serde(alias = "major_trends")]
        trends: Vec<TrendWire>,
    },
    Bare(Vec<TrendWire>),
}

impl AnalysisWire {
    fn into_trends(self) -> Vec<TrendWire> {
        match self {
            AnalysisWire::Wrapped { trends } | AnalysisWire::Bare(trends) => trends,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrendWire {
    #[serde(alias = "trend_title")]
    title: String,
    narrative: String,
    #[serde(alias = "technical_implications")]
    technical_note: String,
    developer_impact: String,
    #[serde(alias = "key_developments", alias = "evidence")]
    citations: Vec<CitationWire>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CitationWire {
    Url(String),
    Entry { url: Option<String> },
}

impl CitationWire {
    fn url(&self) -> Option<&str> {
        match self {
            CitationWire::Url(url) => Some(url),
            CitationWire::Entry { url } => url.as_deref(),
        }
    }
}

pub struct Synthesizer {
    llm: Arc<dyn LlmClient + Send + Sync>,
    timeout: Duration,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn LlmClient + Send + Sync>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    pub async fn synthesize(&self, pool: &[ScoredResult], range: &DateRange) -> Synthesis {
        if pool.is_empty() {
            tracing::warn!("pipeline.synthesize.empty_pool");
            return Synthesis::default();
        }

        let proposed = match self.propose(pool, range).await {
            Some(trends) => trends,
            None => return fallback(pool),
        };
        let (clusters, rejected) = validate(proposed, pool);
        if clusters.is_empty() {
            tracing::warn!(rejected, "pipeline.synthesize.no_valid_clusters");
            let mut synthesis = fallback(pool);
            synthesis.rejected_citations = rejected;
            return synthesis;
        }
        tracing::info!(clusters = clusters.len(), rejected, "pipeline.synthesize.done");
        Synthesis {
            clusters,
            used_fallback: false,
            rejected_citations: rejected,
        }
    }

    async fn propose(&self, pool: &[ScoredResult], range: &DateRange) -> Option<Vec<TrendWire>> {
        let prompt = analysis_prompt(pool, range);
        let call = self.llm.analyze(&prompt, 4096, 0.3);
        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "pipeline.synthesize.llm.failed");
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "pipeline.synthesize.llm.timeout"
                );
                return None;
            }
        };
        match lenient_decode::<AnalysisWire>(&response.text) {
            Ok(analysis) => Some(analysis.into_trends()),
            Err(err) => {
                tracing::warn!(error = %err, "pipeline.synthesize.llm.undecodable");
                None
            }
        }
    }
}

/// Applies citation integrity. Returns the surviving clusters and the
/// number of citations that were thrown out.
fn validate(proposed: Vec<TrendWire>, pool: &[ScoredResult]) -> (Vec<TrendCluster>, usize) {
    let by_url: HashMap<&str, &ScoredResult> = pool.iter().map(|r| (r.url(), r)).collect();
    let mut rejected = 0;
    let mut clusters = Vec::new();

    for trend in proposed {
        if clusters.len() >= MAX_CLUSTERS {
            break;
        }
        let mut seen = HashSet::new();
        let mut evidence = Vec::new();
        for citation in &trend.citations {
            let Some(url) = citation.url() else {
                rejected += 1;
                continue;
            };
            match by_url.get(url) {
                Some(item) if item.url_quality != UrlQuality::Poor => {
                    if seen.insert(url) && evidence.len() < MAX_EVIDENCE {
                        evidence.push((*item).clone());
                    }
                }
                _ => {
                    tracing::warn!(
                        url,
                        trend = %trend.title,
                        "pipeline.synthesize.citation.rejected"
                    );
                    rejected += 1;
                }
            }
        }
        if evidence.is_empty() {
            tracing::warn!(trend = %trend.title, "pipeline.synthesize.cluster.dropped");
            continue;
        }
        let title = match trend.title.trim() {
            "" => evidence[0].title().to_string(),
            t => t.to_string(),
        };
        clusters.push(TrendCluster {
            id: format!("trend-{}", clusters.len() + 1),
            title,
            narrative: trend.narrative.trim().to_string(),
            technical_note: trend.technical_note.trim().to_string(),
            developer_impact: trend.developer_impact.trim().to_string(),
            evidence_strength: strength_of(&evidence),
            evidence,
        });
    }
    (clusters, rejected)
}

/// Builds up to six clusters from the pool alone, one per signature group,
/// in rank order.
pub fn fallback(pool: &[ScoredResult]) -> Synthesis {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&ScoredResult>> = HashMap::new();
    for item in pool.iter().filter(|r| r.url_quality != UrlQuality::Poor) {
        let sig = item.content_signature.as_str();
        if !groups.contains_key(sig) {
            order.push(sig);
        }
        groups.entry(sig).or_default().push(item);
    }

    let clusters: Vec<TrendCluster> = order
        .into_iter()
        .take(MAX_FALLBACK_CLUSTERS)
        .enumerate()
        .filter_map(|(i, sig)| {
            let members = groups.get(sig)?;
            let lead = members.first()?;
            let evidence: Vec<ScoredResult> =
                members.iter().take(MAX_EVIDENCE).map(|r| (*r).clone()).collect();
            Some(TrendCluster {
                id: format!("trend-{}", i + 1),
                title: lead.title().to_string(),
                narrative: lead.result.snippet.clone(),
                technical_note: String::new(),
                developer_impact: String::new(),
                evidence_strength: strength_of(&evidence),
                evidence,
            })
        })
        .collect();

    tracing::info!(clusters = clusters.len(), "pipeline.synthesize.fallback");
    Synthesis {
        clusters,
        used_fallback: true,
        rejected_citations: 0,
    }
}

fn strength_of(evidence: &[ScoredResult]) -> EvidenceStrength {
    let sources: BTreeSet<&str> = evidence.iter().map(|r| r.source()).collect();
    EvidenceStrength::from_distinct_sources(sources.len())
}

fn analysis_prompt(pool: &[ScoredResult], range: &DateRange) -> String {
    let mut items = String::new();
    for (i, item) in pool.iter().enumerate() {
        items.push_str(&format!(
            "{n}. {title}\n   source: {source}\n   url: {url}\n   quality: {quality}\n   \
             seen in {freq} result(s)\n   {snippet}\n\n",
            n = i + 1,
            title = item.title(),
            source = item.source(),
            url = item.url(),
            quality = item.url_quality.as_str(),
            freq = item.cross_source_frequency,
            snippet = item.result.snippet,
        ));
    }
    format!(
        r#"Identify the major AI trends of {range} from the search results below.

A trend is a pattern reported by several sources, not a single announcement.
Prefer developments that change what developers build or how they build it.

Rules for citations:
- cite ONLY URLs that appear in the list, copied character for character
- never cite a homepage or a URL you were not given
- at most {max_evidence} citations per trend, strongest first

Return JSON only, in this shape, with at most {max_clusters} trends:
{{"trends": [{{"title": "...", "narrative": "two or three sentences",
  "technical_note": "...", "developer_impact": "...", "citations": ["https://..."]}}]}}

Search results:

{items}"#,
        range = range.label(),
        max_evidence = MAX_EVIDENCE,
        max_clusters = MAX_CLUSTERS,
    )
}
