//! meeting-digest: one preview run.
//! Loads `.env` and the pipeline config, fetches every configured source for
//! the next lookahead window and prints the ranked digest.
//!
//! `--json` prints the processed events as JSON instead of text lines.

use anyhow::Context;
use chrono::Utc;
use meeting_digest::ingest::providers;
use meeting_digest::{telemetry, DigestSummary, Pipeline, PipelineConfig, TimeRange};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let as_json = std::env::args().skip(1).any(|a| a == "--json");

    let cfg = PipelineConfig::load_default().context("loading pipeline configuration")?;
    let adapters = providers::from_config(&cfg.sources);
    if adapters.is_empty() {
        tracing::warn!("no sources configured; the digest will be empty");
    }
    let range = TimeRange::lookahead(Utc::now(), cfg.fetch.lookahead_hours);
    let pipeline = Pipeline::new(cfg).context("building pipeline")?;

    let (events, report) = pipeline.run_with_report(&adapters, &range).await?;
    for s in report.sources.iter().filter(|s| !s.is_ok()) {
        eprintln!("source `{}` skipped: {:?}", s.name, s.status);
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    println!("{}", DigestSummary::from_events(&events).headline());
    for ev in &events {
        println!(
            "{:<6} {:.2}  {}  {:<12}  {}",
            ev.priority_level,
            ev.priority_score,
            ev.start.format("%a %H:%M"),
            ev.category,
            ev.title
        );
    }
    Ok(())
}
