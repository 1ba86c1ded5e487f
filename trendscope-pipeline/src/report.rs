//! Final document: model-written prose when available, a deterministic
//! markdown rendering otherwise, always followed by link repair.
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use trendscope_llm::decode::strip_code_fence;
use trendscope_llm::traits::LlmClient;

use crate::repair::{is_domain_root, link_targets, repair_links, RepairOutcome};
use crate::types::{DateRange, TrendCluster};

const TOP_SOURCES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    pub total_trends: usize,
    pub total_citations: usize,
    /// Most cited evidence domains with their counts, most cited first.
    pub top_sources: Vec<(String, usize)>,
    pub quality_score: f64,
    pub passes: u32,
    pub used_fallback_prose: bool,
    pub generated_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub markdown: String,
    pub date_range: DateRange,
    pub metadata: ReportMetadata,
    pub repair: RepairOutcome,
}

/// Links a reviewer should look at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkAudit {
    pub domain_only: Vec<String>,
    pub missing_citations: Vec<String>,
}

pub struct ReportWriter {
    llm: Arc<dyn LlmClient + Send + Sync>,
    timeout: Duration,
}

impl ReportWriter {
    pub fn new(llm: Arc<dyn LlmClient + Send + Sync>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    pub async fn write(
        &self,
        clusters: &[TrendCluster],
        range: &DateRange,
        quality_score: f64,
        passes: u32,
    ) -> Report {
        let prose = if clusters.is_empty() {
            None
        } else {
            self.prose(clusters, range).await
        };
        let used_fallback_prose = prose.is_none();
        let draft = prose.unwrap_or_else(|| fallback_markdown(clusters, range));

        let repair = repair_links(&draft, clusters);
        let audit = audit_links(&repair.document, clusters);
        if !audit.domain_only.is_empty() || !audit.missing_citations.is_empty() {
            tracing::warn!(
                domain_only = ?audit.domain_only,
                missing = audit.missing_citations.len(),
                "pipeline.report.links.audit"
            );
        }

        let metadata = ReportMetadata {
            total_trends: clusters.len(),
            total_citations: clusters.iter().map(|c| c.evidence.len()).sum(),
            top_sources: top_sources(clusters),
            quality_score,
            passes,
            used_fallback_prose,
            generated_at: Local::now(),
        };
        tracing::info!(
            trends = metadata.total_trends,
            citations = metadata.total_citations,
            repaired = repair.repaired,
            unresolved = repair.unresolved.len(),
            fallback = used_fallback_prose,
            "pipeline.report.done"
        );
        Report {
            markdown: repair.document.clone(),
            date_range: *range,
            metadata,
            repair,
        }
    }

    async fn prose(&self, clusters: &[TrendCluster], range: &DateRange) -> Option<String> {
        let prompt = match report_prompt(clusters, range) {
            Ok(prompt) => prompt,
            Err(err) => {
                tracing::warn!(error = %err, "pipeline.report.prompt.failed");
                return None;
            }
        };
        let call = self.llm.analyze(&prompt, 4096, 0.4);
        let text = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(response)) => response.text,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "pipeline.report.llm.failed");
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "pipeline.report.llm.timeout"
                );
                return None;
            }
        };
        let body = markdown_body(&text);
        if body.is_none() {
            tracing::warn!(
                prefix = %text.trim().chars().take(40).collect::<String>(),
                "pipeline.report.llm.not_markdown"
            );
        }
        body
    }
}

/// Model prose with any code fence removed, kept only when it opens with a
/// markdown heading.
fn markdown_body(text: &str) -> Option<String> {
    let body = strip_code_fence(text.trim());
    body.starts_with('#').then(|| body.to_string())
}

/// A complete report built from the clusters alone.
pub fn fallback_markdown(clusters: &[TrendCluster], range: &DateRange) -> String {
    let mut doc = format!("# Recent AI Trends and Advancements\n## {}\n\n", range.label());
    if clusters.is_empty() {
        doc.push_str("No trends had enough verifiable evidence in this window.\n");
        return doc;
    }

    doc.push_str("### Executive Summary\n\n");
    for cluster in clusters {
        doc.push_str(&format!("- {}\n", cluster.title));
    }
    doc.push_str("\n---\n\n");

    for (i, cluster) in clusters.iter().enumerate() {
        doc.push_str(&format!("### {}. {}\n\n", i + 1, cluster.title));
        if !cluster.narrative.is_empty() {
            doc.push_str(&format!("{}\n\n", cluster.narrative));
        }
        for item in &cluster.evidence {
            doc.push_str(&format!("{} reported: {}\n\n", item.source(), item.title()));
        }
        if !cluster.technical_note.is_empty() {
            doc.push_str(&format!("{}\n\n", cluster.technical_note));
        }
        if !cluster.developer_impact.is_empty() {
            doc.push_str(&format!("{}\n\n", cluster.developer_impact));
        }
        doc.push_str("**Sources:**\n");
        for item in &cluster.evidence {
            let label = item.title().replace(['[', ']'], "");
            doc.push_str(&format!("- [{}]({})\n", label, item.url()));
        }
        doc.push_str("\n---\n\n");
    }
    doc
}

/// Domain-only links still present, and cited URLs absent from the document.
pub fn audit_links(document: &str, clusters: &[TrendCluster]) -> LinkAudit {
    let targets = link_targets(document);
    let present: HashSet<&str> = targets.iter().map(String::as_str).collect();
    let mut missing = Vec::new();
    let mut seen = HashSet::new();
    for item in clusters.iter().flat_map(|c| &c.evidence) {
        if seen.insert(item.url()) && !present.contains(item.url()) {
            missing.push(item.url().to_string());
        }
    }
    LinkAudit {
        domain_only: targets.iter().filter(|t| is_domain_root(t)).cloned().collect(),
        missing_citations: missing,
    }
}

fn top_sources(clusters: &[TrendCluster]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for item in clusters.iter().flat_map(|c| &c.evidence) {
        *counts.entry(item.source()).or_default() += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(s, n)| (s.to_string(), n))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(TOP_SOURCES);
    ranked
}

#[derive(Serialize)]
struct TrendForPrompt<'a> {
    title: &'a str,
    narrative: &'a str,
    technical_note: &'a str,
    developer_impact: &'a str,
    evidence_strength: crate::types::EvidenceStrength,
    sources: Vec<SourceForPrompt<'a>>,
}

#[derive(Serialize)]
struct SourceForPrompt<'a> {
    title: &'a str,
    source: &'a str,
    url: &'a str,
}

fn report_prompt(clusters: &[TrendCluster], range: &DateRange) -> serde_json::Result<String> {
    let trends: Vec<TrendForPrompt<'_>> = clusters
        .iter()
        .map(|c| TrendForPrompt {
            title: &c.title,
            narrative: &c.narrative,
            technical_note: &c.technical_note,
            developer_impact: &c.developer_impact,
            evidence_strength: c.evidence_strength,
            sources: c
                .evidence
                .iter()
                .map(|e| SourceForPrompt {
                    title: e.title(),
                    source: e.source(),
                    url: e.url(),
                })
                .collect(),
        })
        .collect();
    let data = serde_json::to_string_pretty(&trends)?;
    Ok(format!(
        r#"Write an AI trends report for developers covering {range}, 1000 to 1200 words.

Structure:

# Recent AI Trends and Advancements
## {range}

### Executive Summary
- one bullet per trend, under 20 words each
- a final bullet with the overall direction

---

Then one section per trend:

### <trend title>
150 to 200 words: what is happening, who is involved, what it means for developers.

**Sources:**
- [<source title>](<exact url from the data>)

Link rules:
- links appear only in the Sources lists
- copy each URL exactly as given; never shorten it to a homepage

Trend data:
{data}"#,
        range = range.label(),
    ))
}

/// Writes the report under `dir` and returns the file path.
pub async fn export_report(
    dir: &Path,
    report: &Report,
    now: DateTime<Local>,
) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let name = format!(
        "trends-report-{}_to_{}-{}.md",
        report.date_range.start.format("%Y-%m-%d"),
        report.date_range.end.format("%Y-%m-%d"),
        now.format("%Y-%m-%d-%H-%M-%S"),
    );
    let path = dir.join(name);
    tokio::fs::write(&path, report.markdown.as_bytes()).await?;
    tracing::info!(
        path = %path.display(),
        bytes = report.markdown.len(),
        "pipeline.report.exported"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EvidenceStrength, ScoredResult, SearchResult, UrlQuality};
    use chrono::TimeZone;

    fn item(title: &str, url: &str, source: &str) -> ScoredResult {
        ScoredResult {
            result: SearchResult {
                title: title.into(),
                snippet: String::new(),
                url: url.into(),
                source: source.into(),
                published_at: None,
                origin_query: "q".into(),
                targeted_source: None,
            },
            url_quality: UrlQuality::High,
            relevance_score: 1.0,
            content_signature: title.into(),
            cross_source_frequency: 1,
        }
    }

    fn clusters() -> Vec<TrendCluster> {
        vec![TrendCluster {
            id: "trend-1".into(),
            title: "Agent SDKs".into(),
            narrative: "Vendors shipped agent toolkits.".into(),
            evidence: vec![
                item(
                    "OpenAI ships [Agents] SDK",
                    "https://openai.com/index/new-tools-for-building-agents/",
                    "openai.com",
                ),
                item(
                    "Google previews ADK",
                    "https://blog.google/technology/ai/agent-development-kit/",
                    "blog.google",
                ),
                item(
                    "OpenAI agents deep dive",
                    "https://openai.com/index/agents-deep-dive-for-developers/",
                    "openai.com",
                ),
            ],
            technical_note: String::new(),
            developer_impact: "Less glue code.".into(),
            evidence_strength: EvidenceStrength::Medium,
        }]
    }

    fn range() -> DateRange {
        DateRange::ending_at(Local.with_ymd_and_hms(2025, 3, 15, 9, 0, 0).unwrap(), 14)
    }

    #[test]
    fn fallback_cites_every_evidence_url() {
        let doc = fallback_markdown(&clusters(), &range());
        assert!(doc.starts_with(
            "# Recent AI Trends and Advancements\n## March 01 - March 15, 2025"
        ));
        let cited = "- [OpenAI ships Agents SDK]\
                     (https://openai.com/index/new-tools-for-building-agents/)";
        assert!(doc.contains(cited));
        let audit = audit_links(&doc, &clusters());
        assert_eq!(audit, LinkAudit::default());
    }

    #[test]
    fn fenced_prose_is_unwrapped() {
        let fenced = "```markdown\n# AI Trends\n\n### 1. Agents\n```\n";
        assert_eq!(
            markdown_body(fenced).as_deref(),
            Some("# AI Trends\n\n### 1. Agents")
        );
        assert_eq!(markdown_body("  # Plain heading\n").as_deref(), Some("# Plain heading"));
        assert_eq!(markdown_body("Sure! Here is the report."), None);
        assert_eq!(markdown_body("```json\n{\"a\": 1}\n```"), None);
    }

    #[test]
    fn empty_trend_set_still_renders() {
        let doc = fallback_markdown(&[], &range());
        assert!(doc.contains("No trends had enough verifiable evidence"));
    }

    #[test]
    fn audit_flags_homepages_and_missing_citations() {
        let doc = "### Agent SDKs\n- [OpenAI](https://openai.com/)\n";
        let audit = audit_links(doc, &clusters());
        assert_eq!(audit.domain_only, vec!["https://openai.com/"]);
        assert_eq!(audit.missing_citations.len(), 3);
    }

    #[test]
    fn top_sources_are_counted() {
        assert_eq!(
            top_sources(&clusters()),
            vec![("openai.com".to_string(), 2), ("blog.google".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn export_names_file_after_window_and_time() {
        let dir = tempfile::tempdir().unwrap();
        let report = Report {
            markdown: "# Report\n".into(),
            date_range: range(),
            metadata: ReportMetadata {
                total_trends: 0,
                total_citations: 0,
                top_sources: Vec::new(),
                quality_score: 0.0,
                passes: 1,
                used_fallback_prose: true,
                generated_at: Local::now(),
            },
            repair: repair_links("# Report\n", &[]),
        };
        let now = Local.with_ymd_and_hms(2025, 3, 15, 10, 20, 30).unwrap();
        let path = export_report(&dir.path().join("out"), &report, now).await.unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "trends-report-2025-03-01_to_2025-03-15-2025-03-15-10-20-30.md"
        );
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# Report\n");
    }
}
