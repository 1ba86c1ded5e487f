//! The run loop.
//!
//! ```text
//! GenerateQueries -> Retrieve -> Rank -> Synthesize -> Reflect -> Report
//!                       ^                                  |
//!                       +------- RefineAndRetrieve <-------+
//! ```
//!
//! The refine edge is taken only while `needs_improvement` holds and fewer
//! than [`MAX_EXTRA_ITERATIONS`] refinements have happened, so a run makes at
//! most three retrieval passes.
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;
use trendscope_config::{PipelineSettings, MAX_EXTRA_ITERATIONS};
use trendscope_llm::traits::LlmClient;
use trendscope_search::{RecencyWindow, SearchProvider};

use crate::queries::QueryPlanner;
use crate::rank::{RankStats, Ranker};
use crate::reflect::{QualityMetrics, Reflector};
use crate::refine::refine;
use crate::report::{Report, ReportWriter};
use crate::retrieve::Retriever;
use crate::synthesize::Synthesizer;
use crate::types::{DateRange, IterationState, ScoredResult, SearchResult, TrendCluster};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    GenerateQueries,
    Retrieve,
    Rank,
    Synthesize,
    Reflect,
    RefineAndRetrieve,
    Report,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Report)
    }
}

/// Pure transition function. `Report` is absorbing.
pub fn next_stage(current: Stage, state: &IterationState) -> Stage {
    match current {
        Stage::GenerateQueries => Stage::Retrieve,
        Stage::Retrieve => Stage::Rank,
        Stage::Rank => Stage::Synthesize,
        Stage::Synthesize => Stage::Reflect,
        Stage::Reflect
            if state.needs_improvement && state.iteration_count < MAX_EXTRA_ITERATIONS =>
        {
            Stage::RefineAndRetrieve
        }
        Stage::Reflect => Stage::Report,
        Stage::RefineAndRetrieve => Stage::Retrieve,
        Stage::Report => Stage::Report,
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: Report,
    pub state: IterationState,
    pub clusters: Vec<TrendCluster>,
    pub pool: Vec<ScoredResult>,
    pub metrics: QualityMetrics,
    pub last_rank: RankStats,
    /// Retrieval passes executed, between one and three.
    pub passes: u32,
    pub stages: Vec<Stage>,
}

pub struct Pipeline {
    settings: Arc<PipelineSettings>,
    planner: QueryPlanner,
    retriever: Retriever,
    ranker: Ranker,
    synthesizer: Synthesizer,
    reflector: Reflector,
    writer: ReportWriter,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        llm: Arc<dyn LlmClient + Send + Sync>,
        search: Arc<dyn SearchProvider + Send + Sync>,
    ) -> Self {
        let settings = Arc::new(settings);
        let generation = Duration::from_secs(settings.generation_timeout_secs);
        Self {
            planner: QueryPlanner::new(llm.clone(), settings.clone()),
            retriever: Retriever::new(
                search,
                RecencyWindow::days(settings.recency_days),
                Duration::from_millis(settings.provider_delay_ms),
                Duration::from_secs(settings.provider_timeout_secs),
            ),
            ranker: Ranker::new(&settings),
            synthesizer: Synthesizer::new(llm.clone(), generation),
            reflector: Reflector::new(&settings),
            writer: ReportWriter::new(llm, generation),
            settings,
        }
    }

    pub async fn run(&self) -> RunOutcome {
        self.run_at(Local::now()).await
    }

    /// Runs the loop for the window ending at `now`. Always yields a report.
    pub async fn run_at(&self, now: DateTime<Local>) -> RunOutcome {
        let range = DateRange::ending_at(now, self.settings.recency_days);
        let mut state = IterationState::default();
        let mut gathered: Vec<SearchResult> = Vec::new();
        let mut executed = 0usize;
        let mut passes = 0u32;
        let mut pool: Vec<ScoredResult> = Vec::new();
        let mut last_rank = RankStats::default();
        let mut clusters: Vec<TrendCluster> = Vec::new();
        let mut metrics = QualityMetrics::default();
        let mut stages = Vec::new();

        tracing::info!(window = %range.label(), "pipeline.run.start");
        let mut stage = Stage::GenerateQueries;
        while !stage.is_terminal() {
            stages.push(stage);
            match stage {
                Stage::GenerateQueries => {
                    state.search_queries = self.planner.initial_queries(&range).await;
                }
                Stage::Retrieve => {
                    let pending = &state.search_queries[executed..];
                    gathered.extend(self.retriever.retrieve(pending).await);
                    executed = state.search_queries.len();
                    passes += 1;
                }
                Stage::Rank => {
                    let ranked = self.ranker.rank(&gathered);
                    pool = ranked.results;
                    last_rank = ranked.stats;
                }
                Stage::Synthesize => {
                    clusters = self.synthesizer.synthesize(&pool, &range).await.clusters;
                }
                Stage::Reflect => {
                    let reflection =
                        self.reflector.reflect(&clusters, &pool, state.iteration_count);
                    state.quality_score = reflection.quality_score;
                    state.needs_improvement = reflection.needs_improvement;
                    state.improvement_areas = reflection.improvement_areas;
                    metrics = reflection.metrics;
                }
                Stage::RefineAndRetrieve => {
                    refine(&mut state, &self.settings.refinement);
                }
                Stage::Report => {}
            }
            stage = next_stage(stage, &state);
        }
        stages.push(Stage::Report);

        let report = self
            .writer
            .write(&clusters, &range, state.quality_score, passes)
            .await;
        tracing::info!(
            passes,
            quality_score = state.quality_score,
            trends = clusters.len(),
            queries = state.search_queries.len(),
            results = gathered.len(),
            "pipeline.run.done"
        );
        RunOutcome {
            report,
            state,
            clusters,
            pool,
            metrics,
            last_rank,
            passes,
            stages,
        }
    }
}
