// src/telemetry.rs
//! Logging and metrics plumbing.
//!
//! Meeting titles are personal data: debug logs carry `anon_hash(title)`,
//! never the title itself.

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// One-time metrics registration so series show up on whatever recorder the
/// host installs.
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "pipeline_raw_events_total",
            "Events received from all sources before filtering."
        );
        describe_counter!(
            "pipeline_filtered_total",
            "Events removed by the noise filter."
        );
        describe_counter!(
            "pipeline_malformed_total",
            "Events dropped for violating their structural invariant."
        );
        describe_counter!(
            "pipeline_dedup_merged_total",
            "Records folded into another record's dedup group."
        );
        describe_counter!(
            "pipeline_output_events_total",
            "Processed events emitted by the pipeline."
        );
        describe_counter!(
            "ingest_source_errors_total",
            "Source adapter fetch failures."
        );
        describe_counter!(
            "ingest_source_timeouts_total",
            "Source adapter fetches cut off by the per-source timeout."
        );
        describe_histogram!("ingest_fetch_ms", "Per-source fetch time in milliseconds.");
        describe_gauge!(
            "pipeline_last_run_ts",
            "Unix ts when the pipeline last completed a run."
        );
    });
}

/// Short, stable, non-reversible id for a piece of text.
pub fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Install the global subscriber. `RUST_LOG` wins; otherwise info for this
/// crate and warn for dependencies. `MEETING_DIGEST_LOG_JSON=1` switches to
/// JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("meeting_digest=info,pipeline=info,ingest=info,warn"));

    let json = std::env::var("MEETING_DIGEST_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if let Err(e) = res {
        eprintln!("tracing already initialised: {e}");
    }
}
