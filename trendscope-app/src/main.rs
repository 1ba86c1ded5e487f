use anyhow::{Context, Result};
use clap::Parser;
use trendscope_common::observability::{LogConfig, init_logging};
use trendscope_config::{TrendscopeConfig, TrendscopeConfigLoader, default_config_path};
use trendscope_llm::ensure_llm_ready;
use trendscope_pipeline::{Pipeline, export_report};
use trendscope_search::ensure_search_ready;

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // 1) Config: file, then TRENDSCOPE__* env, then flags
    let path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut cfg: TrendscopeConfig = TrendscopeConfigLoader::new()
        .with_optional_file(&path)
        .load()
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    cli.apply(&mut cfg);

    if cli.print_config {
        print!("{}", cfg.to_redacted_yaml()?);
        return Ok(());
    }

    // 2) Logging
    let log_file = init_logging(LogConfig {
        app_name: "trendscope",
        log_dir: cfg.log.dir.clone(),
        emit_stderr: cfg.log.stderr,
        format: cfg.log.format,
        default_filter: "info",
    })?;
    tracing::info!(config = %path.display(), log_file = %log_file.display(), "app.start");

    // 3) Collaborators
    let llm = ensure_llm_ready(&cfg.llm)
        .await
        .context("building the text-generation client")?;
    let search = ensure_search_ready(&cfg.search).context("building the search provider")?;

    // 4) Run and export
    let pipeline = Pipeline::new(cfg.pipeline.clone(), llm, search);
    let outcome = pipeline.run().await;
    let written = export_report(&cfg.output_dir, &outcome.report, chrono::Local::now())
        .await
        .with_context(|| format!("writing report to {}", cfg.output_dir.display()))?;

    let meta = &outcome.report.metadata;
    println!("Report: {}", written.display());
    println!(
        "Window: {} | passes: {} | quality: {:.1} | trends: {} | citations: {}",
        outcome.report.date_range.label(),
        meta.passes,
        meta.quality_score,
        meta.total_trends,
        meta.total_citations,
    );
    if !meta.top_sources.is_empty() {
        let top: Vec<String> = meta
            .top_sources
            .iter()
            .map(|(source, n)| format!("{source} ({n})"))
            .collect();
        println!("Top sources: {}", top.join(", "));
    }
    if !outcome.report.repair.unresolved.is_empty() {
        println!(
            "Unresolved homepage links: {}",
            outcome.report.repair.unresolved.join(", ")
        );
    }
    tracing::info!(path = %written.display(), "app.done");
    Ok(())
}
