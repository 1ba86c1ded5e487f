//! Iterative retrieval, ranking and reflection over web search results.
//!
//! [`Pipeline`] drives the whole run: plan queries, retrieve, rank, group
//! into trends, score the trend set, and either refine the queries for
//! another pass or write the report. Collaborator failures degrade to empty
//! or fallback values, so a run always ends with a report.
pub mod classify;
pub mod controller;
pub mod normalize;
pub mod queries;
pub mod rank;
pub mod reflect;
pub mod refine;
pub mod repair;
pub mod report;
pub mod retrieve;
pub mod synthesize;
pub mod text;
pub mod types;

pub use controller::{next_stage, Pipeline, RunOutcome, Stage};
pub use report::{export_report, Report, ReportMetadata};
pub use types::{
    DateRange, EvidenceStrength, ImprovementArea, IterationState, ScoredResult, SearchQuery,
    SearchResult, TrendCluster, UrlQuality,
};
