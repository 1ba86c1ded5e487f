mod common;

use chrono::{Local, TimeZone};
use common::{FakeLlm, FakeSearch, PromptKind, hit};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use trendscope_config::PipelineSettings;
use trendscope_pipeline::{Pipeline, Stage, UrlQuality};
use trendscope_search::{RawHit, SearchError};

const DOMAINS: [&str; 5] = [
    "openai.com",
    "anthropic.com",
    "huggingface.co",
    "techcrunch.com",
    "venturebeat.com",
];

fn story_url(i: usize) -> String {
    format!("https://{}/2025/03/story-{i}-about-ai-agents", DOMAINS[i % DOMAINS.len()])
}

fn good_hits() -> Vec<RawHit> {
    let mut hits: Vec<RawHit> = (0..15)
        .map(|i| {
            hit(
                &format!("Story {i}: AI agents ship with new SDK tooling"),
                &story_url(i),
                "Vendors and outlets describe how AI agent toolkits reached general \
                 availability this month.",
            )
        })
        .collect();
    hits.push(hit(
        "Search results for AI agents this week",
        "https://example.com/search?q=ai",
        "AI agents search listing",
    ));
    hits.push(RawHit {
        title: None,
        ..hit("", "https://example.com/2025/03/untitled-story", "AI")
    });
    hits
}

fn settings() -> PipelineSettings {
    PipelineSettings {
        provider_delay_ms: 0,
        ..Default::default()
    }
}

fn now() -> chrono::DateTime<Local> {
    Local.with_ymd_and_hms(2025, 3, 15, 9, 0, 0).unwrap()
}

fn trends_json() -> String {
    let narrative = "Several vendors shipped agent toolkits in the same fortnight, and \
                     independent outlets covered the launches with hands-on detail for developers.";
    let trends: Vec<serde_json::Value> = (0..5)
        .map(|k| {
            let mut citations: Vec<String> = (3 * k..3 * k + 3).map(story_url).collect();
            if k == 0 {
                citations.push("https://openai.com/".into());
                citations.push("https://fabricated.example/2025/03/never-retrieved".into());
            }
            json!({
                "title": format!("Trend {k}"),
                "narrative": narrative,
                "technical_note": "Tool calling moved into first-party SDKs with typed schemas.",
                "developer_impact": "Less glue code.",
                "citations": citations,
            })
        })
        .collect();
    format!("Here you go:\n```json\n{}\n```", json!({ "trends": trends }))
}

fn report_markdown() -> String {
    "# Recent AI Trends and Advancements\n\n### Trend 0\n\nAgents everywhere.\n\n\
     **Sources:**\n- [OpenAI](https://openai.com/)\n"
        .to_string()
}

fn healthy_llm() -> FakeLlm {
    FakeLlm::new(|kind, _| {
        Ok(match kind {
            PromptKind::Queries => {
                let queries: Vec<String> =
                    (0..15).map(|i| format!("ai agents query {i}")).collect();
                json!(queries).to_string()
            }
            PromptKind::Trends => trends_json(),
            PromptKind::Report => report_markdown(),
            PromptKind::Other => String::new(),
        })
    })
}

#[tokio::test]
async fn strong_evidence_finishes_in_one_pass() {
    common::init_test_tracing();
    let search = Arc::new(FakeSearch::always(good_hits()));
    let pipeline = Pipeline::new(settings(), Arc::new(healthy_llm()), search.clone());

    let outcome = pipeline.run_at(now()).await;

    assert_eq!(outcome.passes, 1);
    assert_eq!(outcome.state.iteration_count, 0);
    assert!(!outcome.state.needs_improvement);
    assert!(outcome.state.quality_score >= 65.0);
    assert_eq!(
        outcome.stages,
        vec![
            Stage::GenerateQueries,
            Stage::Retrieve,
            Stage::Rank,
            Stage::Synthesize,
            Stage::Reflect,
            Stage::Report,
        ]
    );

    // every planned query ran exactly once
    assert_eq!(search.calls().len(), outcome.state.search_queries.len());
    assert!(outcome.state.search_queries.iter().any(|q| q.targeted_source.is_some()));

    assert_eq!(outcome.pool.len(), 15);
    assert!(outcome.pool.iter().all(|r| !r.url().contains("search?")));

    let pool_urls: HashSet<&str> = outcome.pool.iter().map(|r| r.url()).collect();
    assert_eq!(outcome.clusters.len(), 5);
    for cluster in &outcome.clusters {
        assert!(!cluster.evidence.is_empty() && cluster.evidence.len() <= 5);
        for item in &cluster.evidence {
            assert!(pool_urls.contains(item.url()));
            assert_ne!(item.url_quality, UrlQuality::Poor);
        }
    }
    let first: Vec<&str> = outcome.clusters[0].evidence.iter().map(|e| e.url()).collect();
    assert_eq!(first, vec![story_url(0), story_url(1), story_url(2)]);

    let report = &outcome.report;
    assert!(!report.metadata.used_fallback_prose);
    assert_eq!(report.repair.repaired, 1);
    assert!(report.markdown.contains(&format!("[OpenAI]({})", story_url(0))));
    assert!(!report.markdown.contains("(https://openai.com/)"));
    assert_eq!(report.metadata.total_trends, 5);
    assert_eq!(report.metadata.total_citations, 15);
}

#[tokio::test]
async fn weak_evidence_stops_after_three_passes() {
    common::init_test_tracing();
    let search = Arc::new(FakeSearch::always(vec![
        hit(
            "Small lab posts AI agent notes",
            "https://smallblog.dev/2025/03/agent-notes-from-the-lab",
            "AI notes",
        ),
        hit(
            "Another lab shares reasoning model results",
            "https://otherlab.dev/2025/03/reasoning-model-results",
            "AI results",
        ),
    ]));
    let llm = Arc::new(FakeLlm::offline());
    let pipeline = Pipeline::new(settings(), llm.clone(), search.clone());

    let outcome = pipeline.run_at(now()).await;

    assert_eq!(outcome.passes, 3);
    assert_eq!(outcome.state.iteration_count, 2);
    assert!(outcome.state.quality_score < 65.0);
    assert!(!outcome.state.needs_improvement);
    assert_eq!(
        outcome.stages.iter().filter(|s| **s == Stage::RefineAndRetrieve).count(),
        2
    );

    // fallback queries plus fixed and curated ones, then two refinements
    let initial = 15 + 7 + 40;
    assert!(outcome.state.search_queries.len() > initial);
    let calls = search.calls();
    assert_eq!(calls.len(), outcome.state.search_queries.len());
    let unique: HashSet<&String> = calls.iter().collect();
    assert_eq!(unique.len(), calls.len());

    assert_eq!(outcome.clusters.len(), 2);
    assert!(outcome.report.metadata.used_fallback_prose);
    assert!(outcome.report.markdown.starts_with("# Recent AI Trends and Advancements"));
    assert!(
        outcome
            .report
            .markdown
            .contains("https://smallblog.dev/2025/03/agent-notes-from-the-lab")
    );
}

#[tokio::test]
async fn failing_search_still_produces_a_report() {
    common::init_test_tracing();
    let search = Arc::new(FakeSearch::new(|_| {
        Err(SearchError::Config("quota exhausted".into()))
    }));
    let pipeline = Pipeline::new(settings(), Arc::new(healthy_llm()), search);

    let outcome = pipeline.run_at(now()).await;

    assert_eq!(outcome.passes, 3);
    assert!(outcome.pool.is_empty());
    assert!(outcome.clusters.is_empty());
    assert_eq!(outcome.state.quality_score, 0.0);
    assert!(outcome.report.markdown.contains("No trends had enough verifiable evidence"));
}

#[tokio::test]
async fn unusable_model_output_falls_back_to_pool_clusters() {
    common::init_test_tracing();
    let llm = FakeLlm::new(|kind, _| {
        Ok(match kind {
            PromptKind::Queries => "[\"only one query\"]".to_string(),
            PromptKind::Trends => json!({
                "trends": [{"title": "Ghost", "citations": ["https://ghost.example/a"]}]
            })
            .to_string(),
            _ => "I cannot write that report.".to_string(),
        })
    });
    let search = Arc::new(FakeSearch::always(good_hits()));
    let pipeline = Pipeline::new(settings(), Arc::new(llm), search);

    let outcome = pipeline.run_at(now()).await;

    assert!(!outcome.clusters.is_empty() && outcome.clusters.len() <= 6);
    let pool_urls: HashSet<&str> = outcome.pool.iter().map(|r| r.url()).collect();
    assert!(
        outcome
            .clusters
            .iter()
            .flat_map(|c| &c.evidence)
            .all(|e| pool_urls.contains(e.url()))
    );
    assert!(outcome.report.metadata.used_fallback_prose);
    assert!(outcome.report.repair.unresolved.is_empty());
}

#[tokio::test]
async fn report_is_exported_under_the_output_dir() {
    common::init_test_tracing();
    let search = Arc::new(FakeSearch::always(good_hits()));
    let pipeline = Pipeline::new(settings(), Arc::new(healthy_llm()), search);
    let outcome = pipeline.run_at(now()).await;

    let dir = tempfile::tempdir().unwrap();
    let path = trendscope_pipeline::export_report(dir.path(), &outcome.report, now())
        .await
        .unwrap();
    assert!(path.starts_with(dir.path()));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), outcome.report.markdown);
}
