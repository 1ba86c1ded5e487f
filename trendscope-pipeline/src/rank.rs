//! Filtering, scoring, deduplication and the diversity cap.
use std::collections::{BTreeSet, HashMap, HashSet};
use trendscope_config::{PipelineSettings, RankingSettings};

use crate::classify::UrlClassifier;
use crate::text::{contains_phrase, domain_matches, padded, tokens};
use crate::types::{ScoredResult, SearchResult};

const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "an", "and", "are", "as", "at", "be", "by", "for", "from",
    "has", "have", "how", "in", "into", "is", "it", "its", "new", "of", "on", "or", "over",
    "says", "than", "that", "the", "their", "this", "to", "up", "via", "was", "what", "when",
    "which", "who", "why", "will", "with", "you", "your",
];

/// Counts of what each filter removed, for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankStats {
    pub input: usize,
    pub duplicate_urls: usize,
    pub excluded_domains: usize,
    pub placeholders: usize,
    pub non_articles: usize,
    pub off_topic: usize,
    pub over_cap: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RankedPool {
    pub results: Vec<ScoredResult>,
    pub stats: RankStats,
    /// Scored results turned away by the per-domain cap, best first.
    pub capped: Vec<ScoredResult>,
}

pub struct Ranker {
    settings: RankingSettings,
    classifier: UrlClassifier,
    excluded: Vec<String>,
    curated_domains: Vec<String>,
}

impl Ranker {
    pub fn new(settings: &PipelineSettings) -> Self {
        let mut ranking = settings.ranking.clone();
        ranking
            .credibility_tiers
            .sort_by(|a, b| b.bonus.total_cmp(&a.bonus));
        Self {
            settings: ranking,
            classifier: UrlClassifier::new(&settings.sources),
            excluded: settings.sources.excluded_domains.clone(),
            curated_domains: settings
                .sources
                .curated_sources
                .iter()
                .map(|s| s.domain.clone())
                .collect(),
        }
    }

    pub fn classifier(&self) -> &UrlClassifier {
        &self.classifier
    }

    /// Produces the ranked pool. The output depends only on the set of
    /// input results, never on their order.
    pub fn rank(&self, results: &[SearchResult]) -> RankedPool {
        let mut stats = RankStats {
            input: results.len(),
            ..Default::default()
        };

        let unique = dedup_by_url(results);
        stats.duplicate_urls = results.len() - unique.len();

        let mut kept = Vec::with_capacity(unique.len());
        for result in unique {
            if self.excluded.iter().any(|d| domain_matches(&result.source, d)) {
                stats.excluded_domains += 1;
                continue;
            }
            if self.is_placeholder(&result.title) {
                stats.placeholders += 1;
                continue;
            }
            if self.classifier.is_non_article(&result.url) {
                stats.non_articles += 1;
                continue;
            }
            let text = padded(&format!("{} {}", result.title, result.snippet));
            let keyword_hits = self
                .settings
                .keywords
                .iter()
                .filter(|k| contains_phrase(&text, k))
                .count();
            if self.settings.require_keyword_match && keyword_hits == 0 {
                stats.off_topic += 1;
                continue;
            }
            kept.push((result, keyword_hits));
        }

        let signatures: Vec<String> = kept
            .iter()
            .map(|(r, _)| signature(r, self.settings.signature_words))
            .collect();
        let mut group_sizes: HashMap<&str, usize> = HashMap::new();
        for sig in &signatures {
            *group_sizes.entry(sig.as_str()).or_default() += 1;
        }

        let mut scored: Vec<ScoredResult> = kept
            .iter()
            .zip(&signatures)
            .map(|((result, keyword_hits), sig)| {
                let frequency = group_sizes.get(sig.as_str()).copied().unwrap_or(1);
                let url_quality = self.classifier.classify(&result.url);
                let mut scored = ScoredResult {
                    result: result.clone(),
                    url_quality,
                    relevance_score: 0.0,
                    content_signature: sig.clone(),
                    cross_source_frequency: frequency,
                };
                scored.relevance_score = self.score(&scored, *keyword_hits);
                scored
            })
            .collect();

        scored.sort_by(|a, b| {
            b.relevance_score
                .total_cmp(&a.relevance_score)
                .then_with(|| a.url().cmp(b.url()))
        });

        let mut per_domain: HashMap<String, usize> = HashMap::new();
        let mut pool = Vec::with_capacity(self.settings.max_pool.min(scored.len()));
        let mut capped = Vec::new();
        for item in scored {
            if pool.len() >= self.settings.max_pool {
                stats.over_cap += 1;
                continue;
            }
            let cap = if self.is_curated(item.source()) {
                self.settings.curated_domain_cap
            } else {
                self.settings.per_domain_cap
            };
            let seen = per_domain.entry(item.source().to_string()).or_default();
            if *seen >= cap {
                stats.over_cap += 1;
                capped.push(item);
                continue;
            }
            *seen += 1;
            pool.push(item);
        }

        tracing::debug!(
            input = stats.input,
            duplicates = stats.duplicate_urls,
            excluded = stats.excluded_domains,
            placeholders = stats.placeholders,
            non_articles = stats.non_articles,
            off_topic = stats.off_topic,
            over_cap = stats.over_cap,
            kept = pool.len(),
            "pipeline.rank.done"
        );
        RankedPool {
            results: pool,
            stats,
            capped,
        }
    }

    fn score(&self, item: &ScoredResult, keyword_hits: usize) -> f64 {
        let s = &self.settings;
        let r = &item.result;
        let mut score = keyword_hits as f64 * s.keyword_bonus;

        let title = padded(&r.title);
        if s.technical_terms.iter().any(|t| contains_phrase(&title, t)) {
            score += s.technical_term_bonus;
        }
        if let Some(target) = &r.targeted_source {
            score += s.targeted_query_bonus;
            if domain_matches(&r.source, target) {
                score += s.curated_domain_bonus;
            }
        }
        if let Some(tier) = s
            .credibility_tiers
            .iter()
            .find(|tier| tier.patterns.iter().any(|p| r.source.contains(p.as_str())))
        {
            score += tier.bonus;
        }
        if item.cross_source_frequency > 1 {
            let boost = item.cross_source_frequency as f64 * s.frequency_increment;
            score += boost.min(s.frequency_cap);
        }
        if item.url_quality.is_good() {
            score += s.url_quality_bonus;
        }
        if r.title.chars().count() > s.long_title_chars {
            score += s.long_title_bonus;
        }
        if r.snippet.chars().count() > s.long_snippet_chars {
            score += s.long_snippet_bonus;
        }
        score.max(0.0)
    }

    fn is_placeholder(&self, title: &str) -> bool {
        let title = title.trim();
        let lowered = title.to_lowercase();
        title.chars().count() < self.settings.min_title_chars
            || title.split_whitespace().count() < self.settings.min_title_tokens
            || title.ends_with("...")
            || title.ends_with('\u{2026}')
            || self
                .settings
                .generic_titles
                .iter()
                .any(|g| g.eq_ignore_ascii_case(&lowered))
    }

    fn is_curated(&self, source: &str) -> bool {
        self.curated_domains.iter().any(|d| domain_matches(source, d))
    }
}

/// Keeps one result per exact URL. Among duplicates the targeted result wins,
/// then the lexically smallest query and title, so the survivor does not
/// depend on arrival order.
fn dedup_by_url(results: &[SearchResult]) -> Vec<SearchResult> {
    let mut sorted: Vec<&SearchResult> = results.iter().collect();
    sorted.sort_by(|a, b| {
        a.url
            .cmp(&b.url)
            .then_with(|| a.targeted_source.is_none().cmp(&b.targeted_source.is_none()))
            .then_with(|| a.origin_query.cmp(&b.origin_query))
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.snippet.cmp(&b.snippet))
    });
    let mut seen = HashSet::new();
    sorted
        .into_iter()
        .filter(|r| seen.insert(r.url.as_str()))
        .cloned()
        .collect()
}

/// The most distinctive title words, sorted, or the URL when the title has
/// nothing but stopwords.
pub fn signature(result: &SearchResult, words: usize) -> String {
    let distinct: BTreeSet<String> = tokens(&result.title)
        .into_iter()
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .collect();
    if distinct.is_empty() {
        return result.url.clone();
    }
    let mut by_weight: Vec<String> = distinct.into_iter().collect();
    by_weight.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
    by_weight.truncate(words.max(1));
    by_weight.sort();
    by_weight.join(" ")
}
