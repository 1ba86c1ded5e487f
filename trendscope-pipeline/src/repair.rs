//! Rewrites domain-root links in a generated document to the deep links
//! they stand for.
//!
//! For each `[text](https://host/)` link the candidates are, in order:
//!
//! 1. evidence of the cluster whose `### ` heading most closely precedes the
//!    link, matched on link text against title or source
//! 2. the same cluster's evidence from the link's domain, when exactly one
//!    item qualifies
//! 3. all evidence, matched on link text
//! 4. all evidence from the link's domain, when exactly one item qualifies
//!
//! A link with no candidate stays as it is and is reported. Running the pass
//! twice gives the same document as running it once.
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::text::domain_matches;
use crate::types::{ScoredResult, TrendCluster};

static LINK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\((https?://[^)\s]+)\)").ok());

static DOMAIN_ROOT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^https?://[^/?#]+/?$").ok());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairOutcome {
    pub document: String,
    pub repaired: usize,
    /// Domain-root links left in place, in document order.
    pub unresolved: Vec<String>,
}

pub fn is_domain_root(url: &str) -> bool {
    DOMAIN_ROOT.as_ref().is_some_and(|re| re.is_match(url))
}

/// Every link target in `document`, in order.
pub fn link_targets(document: &str) -> Vec<String> {
    let Some(link) = LINK.as_ref() else {
        return Vec::new();
    };
    link.captures_iter(document)
        .filter_map(|c| c.get(2).map(|m| m.as_str().to_string()))
        .collect()
}

pub fn repair_links(document: &str, clusters: &[TrendCluster]) -> RepairOutcome {
    let Some(link) = LINK.as_ref() else {
        return RepairOutcome {
            document: document.to_string(),
            repaired: 0,
            unresolved: Vec::new(),
        };
    };

    let mut out = String::with_capacity(document.len());
    let mut last = 0;
    let mut repaired = 0;
    let mut unresolved = Vec::new();

    for caps in link.captures_iter(document) {
        let (Some(whole), Some(text), Some(target)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if !is_domain_root(target.as_str()) {
            continue;
        }
        let section = section_cluster(&document[..whole.start()], clusters);
        match find_replacement(text.as_str(), target.as_str(), section, clusters) {
            Some(url) => {
                out.push_str(&document[last..target.start()]);
                out.push_str(url);
                last = target.end();
                repaired += 1;
                tracing::debug!(from = target.as_str(), to = url, "pipeline.repair.link.fixed");
            }
            None => {
                tracing::warn!(
                    text = text.as_str(),
                    target = target.as_str(),
                    "pipeline.repair.link.unresolved"
                );
                unresolved.push(target.as_str().to_string());
            }
        }
    }
    out.push_str(&document[last..]);

    RepairOutcome {
        document: out,
        repaired,
        unresolved,
    }
}

/// The cluster named by the nearest `### ` heading above the link.
fn section_cluster<'a>(before: &str, clusters: &'a [TrendCluster]) -> Option<&'a TrendCluster> {
    let heading = before
        .lines()
        .rev()
        .find_map(|line| line.trim_start().strip_prefix("### "))?
        .to_lowercase();
    clusters.iter().find(|c| {
        let title = c.title.trim().to_lowercase();
        !title.is_empty() && heading.contains(&title)
    })
}

fn find_replacement<'a>(
    text: &str,
    target: &str,
    section: Option<&'a TrendCluster>,
    clusters: &'a [TrendCluster],
) -> Option<&'a str> {
    let host = url::Url::parse(target)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))?;
    let text = text.trim().to_lowercase();

    if let Some(cluster) = section {
        let local: Vec<&ScoredResult> = cluster.evidence.iter().collect();
        if let Some(url) = by_text(&text, &local).or_else(|| by_domain(&host, &local)) {
            return Some(url);
        }
    }
    let all: Vec<&ScoredResult> = clusters.iter().flat_map(|c| &c.evidence).collect();
    by_text(&text, &all).or_else(|| by_domain(&host, &all))
}

fn by_text<'a>(text: &str, evidence: &[&'a ScoredResult]) -> Option<&'a str> {
    let usable = evidence.iter().filter(|e| !is_domain_root(e.url()));
    let mut title_hits = BTreeSet::new();
    let mut source_hits = BTreeSet::new();
    for item in usable {
        let title = item.title().trim().to_lowercase();
        if !title.is_empty() && (title == text || title.contains(text) || text.contains(&title)) {
            title_hits.insert(item.url());
        } else if names_source(text, item.source()) {
            source_hits.insert(item.url());
        }
    }
    unique(&title_hits).or_else(|| unique(&source_hits))
}

fn by_domain<'a>(host: &str, evidence: &[&'a ScoredResult]) -> Option<&'a str> {
    let hits: BTreeSet<&str> = evidence
        .iter()
        .filter(|e| !is_domain_root(e.url()) && domain_matches(host, e.source()))
        .map(|e| e.url())
        .collect();
    unique(&hits)
}

/// `openai` or `openai.com` in the link text names the source `openai.com`.
fn names_source(text: &str, source: &str) -> bool {
    let source = source.to_lowercase();
    let label = source.split('.').next().unwrap_or_default();
    text == source
        || text.contains(&source)
        || (label.len() > 2 && text.split_whitespace().any(|w| w == label))
}

fn unique<'a>(hits: &BTreeSet<&'a str>) -> Option<&'a str> {
    match hits.len() {
        1 => hits.iter().next().copied(),
        _ => None,
    }
}
