//! Scores a trend set and decides whether another pass is worth it.
use std::collections::BTreeSet;
use trendscope_config::{PipelineSettings, QualityWeights, ScoreStep};

use crate::text::domain_matches;
use crate::types::{ImprovementArea, ScoredResult, TrendCluster};

/// The sub-metrics behind a quality score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityMetrics {
    pub trends: usize,
    pub citations: usize,
    pub narrative_ratio: f64,
    pub technical_ratio: f64,
    pub url_quality_ratio: f64,
    pub curated_ratio: f64,
    pub corroborated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reflection {
    pub quality_score: f64,
    pub needs_improvement: bool,
    pub improvement_areas: BTreeSet<ImprovementArea>,
    pub metrics: QualityMetrics,
}

pub struct Reflector {
    weights: QualityWeights,
    curated_domains: Vec<String>,
    extra_iterations: u32,
}

impl Reflector {
    pub fn new(settings: &PipelineSettings) -> Self {
        Self {
            weights: settings.quality.clone(),
            curated_domains: settings
                .sources
                .curated_sources
                .iter()
                .map(|s| s.domain.clone())
                .collect(),
            extra_iterations: settings.extra_iterations(),
        }
    }

    pub fn reflect(
        &self,
        clusters: &[TrendCluster],
        pool: &[ScoredResult],
        iteration_count: u32,
    ) -> Reflection {
        let w = &self.weights;
        let metrics = self.measure(clusters, pool);

        let score = step_points(&w.trend_steps, metrics.trends)
            + step_points(&w.citation_steps, metrics.citations)
            + metrics.narrative_ratio * w.narrative_weight
            + metrics.technical_ratio * w.technical_weight
            + metrics.url_quality_ratio * w.url_quality_weight
            + metrics.curated_ratio * w.curated_weight;
        let quality_score = score.clamp(0.0, 100.0);

        let below = quality_score < w.threshold;
        let needs_improvement = below && iteration_count < self.extra_iterations;

        let mut areas = BTreeSet::new();
        if below {
            if metrics.trends < w.min_trends {
                areas.insert(ImprovementArea::InsufficientTrends);
            }
            if metrics.citations < w.min_citations {
                areas.insert(ImprovementArea::InsufficientDevelopments);
            }
            if metrics.narrative_ratio < w.min_narrative_ratio {
                areas.insert(ImprovementArea::WeakNarratives);
            }
            if metrics.url_quality_ratio < w.min_url_quality_ratio {
                areas.insert(ImprovementArea::PoorUrlQuality);
            }
            if metrics.curated_ratio < w.min_curated_ratio {
                areas.insert(ImprovementArea::InsufficientCuratedSources);
            }
            if !metrics.corroborated {
                areas.insert(ImprovementArea::LackCrossSourceValidation);
            }
        }

        tracing::info!(
            quality_score,
            threshold = w.threshold,
            iteration_count,
            needs_improvement,
            trends = metrics.trends,
            citations = metrics.citations,
            areas = ?areas,
            "pipeline.reflect.done"
        );
        Reflection {
            quality_score,
            needs_improvement,
            improvement_areas: areas,
            metrics,
        }
    }

    fn measure(&self, clusters: &[TrendCluster], pool: &[ScoredResult]) -> QualityMetrics {
        let w = &self.weights;
        let cluster_ratio = |pred: &dyn Fn(&TrendCluster) -> bool| {
            ratio(clusters.iter().filter(|c| pred(*c)).count(), clusters.len())
        };
        let pool_ratio = |pred: &dyn Fn(&ScoredResult) -> bool| {
            ratio(pool.iter().filter(|r| pred(*r)).count(), pool.len())
        };
        QualityMetrics {
            trends: clusters.len(),
            citations: clusters.iter().map(|c| c.evidence.len()).sum(),
            narrative_ratio: cluster_ratio(&|c| {
                c.narrative.chars().count() >= w.narrative_min_chars
            }),
            technical_ratio: cluster_ratio(&|c| {
                c.technical_note.chars().count() + c.developer_impact.chars().count()
                    >= w.technical_min_chars
            }),
            url_quality_ratio: pool_ratio(&|r| r.url_quality.is_good()),
            curated_ratio: pool_ratio(&|r| {
                self.curated_domains
                    .iter()
                    .any(|d| domain_matches(r.source(), d))
            }),
            corroborated: pool.iter().any(|r| r.cross_source_frequency > 1),
        }
    }
}

/// Points for the highest step reached.
fn step_points(steps: &[ScoreStep], value: usize) -> f64 {
    steps
        .iter()
        .filter(|s| value >= s.min)
        .map(|s| s.points)
        .fold(0.0, f64::max)
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
