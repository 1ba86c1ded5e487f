//! Records that flow through the pipeline.
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A validated search hit. Built once by the normalizer and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    /// Exactly as the provider returned it.
    pub url: String,
    /// Host of `url`, lowercased, without a leading `www.`.
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub origin_query: String,
    /// Curated domain the originating query was aimed at, if any.
    pub targeted_source: Option<String>,
}

/// How likely a URL is to be a citable article. Ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlQuality {
    Poor,
    Basic,
    Medium,
    High,
}

impl UrlQuality {
    pub fn is_good(self) -> bool {
        matches!(self, UrlQuality::High | UrlQuality::Medium)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UrlQuality::Poor => "poor",
            UrlQuality::Basic => "basic",
            UrlQuality::Medium => "medium",
            UrlQuality::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub result: SearchResult,
    pub url_quality: UrlQuality,
    pub relevance_score: f64,
    pub content_signature: String,
    /// Size of the signature group this result belongs to, itself included.
    pub cross_source_frequency: usize,
}

impl ScoredResult {
    pub fn url(&self) -> &str {
        &self.result.url
    }

    pub fn source(&self) -> &str {
        &self.result.source
    }

    pub fn title(&self) -> &str {
        &self.result.title
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceStrength {
    Weak,
    Medium,
    Strong,
}

impl EvidenceStrength {
    /// Strength follows how many independent domains back the cluster.
    pub fn from_distinct_sources(n: usize) -> Self {
        match n {
            0 | 1 => EvidenceStrength::Weak,
            2 => EvidenceStrength::Medium,
            _ => EvidenceStrength::Strong,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendCluster {
    pub id: String,
    pub title: String,
    pub narrative: String,
    /// At most five citations, each an exact member of the ranked pool.
    pub evidence: Vec<ScoredResult>,
    pub technical_note: String,
    pub developer_impact: String,
    pub evidence_strength: EvidenceStrength,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub targeted_source: Option<String>,
}

impl SearchQuery {
    pub fn general(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            targeted_source: None,
        }
    }

    pub fn targeted(text: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            targeted_source: Some(domain.into()),
        }
    }
}

/// A named deficiency found by the reflector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementArea {
    InsufficientTrends,
    InsufficientDevelopments,
    WeakNarratives,
    PoorUrlQuality,
    InsufficientCuratedSources,
    LackCrossSourceValidation,
}

impl ImprovementArea {
    pub fn as_str(self) -> &'static str {
        match self {
            ImprovementArea::InsufficientTrends => "insufficient_trends",
            ImprovementArea::InsufficientDevelopments => "insufficient_developments",
            ImprovementArea::WeakNarratives => "weak_narratives",
            ImprovementArea::PoorUrlQuality => "poor_url_quality",
            ImprovementArea::InsufficientCuratedSources => "insufficient_curated_sources",
            ImprovementArea::LackCrossSourceValidation => "lack_cross_source_validation",
        }
    }
}

impl fmt::Display for ImprovementArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loop state owned by the controller for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IterationState {
    /// Refinement passes taken so far; never exceeds two.
    pub iteration_count: u32,
    pub quality_score: f64,
    pub needs_improvement: bool,
    pub improvement_areas: BTreeSet<ImprovementArea>,
    pub search_queries: Vec<SearchQuery>,
}

/// The window a run reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl DateRange {
    pub fn ending_at(end: DateTime<Local>, days: u32) -> Self {
        Self {
            start: end - chrono::Duration::days(i64::from(days)),
            end,
        }
    }

    /// `March 01 - March 15, 2025`
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.start.format("%B %d"),
            self.end.format("%B %d, %Y")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn quality_tiers_are_ordered() {
        assert!(UrlQuality::Poor < UrlQuality::Basic);
        assert!(UrlQuality::Medium < UrlQuality::High);
        assert!(UrlQuality::Medium.is_good());
        assert!(!UrlQuality::Basic.is_good());
    }

    #[test]
    fn strength_tracks_distinct_sources() {
        assert_eq!(EvidenceStrength::from_distinct_sources(1), EvidenceStrength::Weak);
        assert_eq!(EvidenceStrength::from_distinct_sources(2), EvidenceStrength::Medium);
        assert_eq!(EvidenceStrength::from_distinct_sources(4), EvidenceStrength::Strong);
    }

    #[test]
    fn date_range_label() {
        let end = Local.with_ymd_and_hms(2025, 3, 15, 9, 0, 0).unwrap();
        let range = DateRange::ending_at(end, 14);
        assert_eq!(range.label(), "March 01 - March 15, 2025");
    }
}
