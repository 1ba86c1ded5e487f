//! Extends the query list to address the deficiencies the reflector found.
use std::collections::HashSet;
use trendscope_config::RefinementSettings;

use crate::types::{ImprovementArea, IterationState, SearchQuery};

/// Candidate queries for one deficiency. `site:` queries are targeted at
/// the named domain.
pub fn queries_for(area: ImprovementArea, settings: &RefinementSettings) -> Vec<SearchQuery> {
    let texts = match area {
        ImprovementArea::InsufficientTrends => &settings.insufficient_trends,
        ImprovementArea::InsufficientDevelopments => &settings.insufficient_developments,
        ImprovementArea::WeakNarratives => &settings.weak_narratives,
        ImprovementArea::PoorUrlQuality => &settings.poor_url_quality,
        ImprovementArea::InsufficientCuratedSources => &settings.insufficient_curated_sources,
        ImprovementArea::LackCrossSourceValidation => &settings.lack_cross_source_validation,
    };
    texts.iter().map(|text| to_query(text)).collect()
}

fn to_query(text: &str) -> SearchQuery {
    let site = text
        .split_whitespace()
        .find_map(|word| word.strip_prefix("site:"))
        .filter(|domain| !domain.is_empty());
    match site {
        Some(domain) => SearchQuery::targeted(text, domain.to_ascii_lowercase()),
        None => SearchQuery::general(text),
    }
}

/// Appends up to `max_new_queries` new queries, skipping any already
/// present, and advances the iteration counter by exactly one. Returns how
/// many queries were added.
pub fn refine(state: &mut IterationState, settings: &RefinementSettings) -> usize {
    let mut known: HashSet<String> = state
        .search_queries
        .iter()
        .map(|q| q.text.to_lowercase())
        .collect();

    let mut added = Vec::new();
    for area in &state.improvement_areas {
        for query in queries_for(*area, settings) {
            if added.len() >= settings.max_new_queries {
                break;
            }
            if known.insert(query.text.to_lowercase()) {
                added.push(query);
            }
        }
    }

    let count = added.len();
    state.search_queries.extend(added);
    state.iteration_count += 1;
    tracing::info!(
        iteration = state.iteration_count,
        added = count,
        total = state.search_queries.len(),
        "pipeline.refine.done"
    );
    count
}
