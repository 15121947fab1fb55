// src/ingest/mod.rs
//! Fan-out / fan-in over source adapters.
//!
//! Every adapter runs concurrently under its own timeout. A source that errors,
//! panics or times out contributes zero events and is reported; it never
//! fails the run. Results are concatenated in adapter order, so the
//! downstream stages see a deterministic input for a given adapter list.
//!
//! Dropping the future returned by [`fetch_all`] drops every outstanding
//! fetch, which is how a caller cancels a run.

pub mod providers;
pub mod types;

use futures::future::join_all;
use futures::FutureExt;
use metrics::{counter, histogram};
use once_cell::sync::OnceCell;
use regex::Regex;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use crate::error::FetchError;
use crate::model::{SourceEvent, TimeRange};
use crate::telemetry::ensure_metrics_described;
pub use types::{SourceAdapter, SourceReport, SourceStatus};

/// Everything the fetch stage produced.
#[derive(Debug, Default)]
pub struct FanIn {
    pub events: Vec<SourceEvent>,
    pub sources: Vec<SourceReport>,
}

impl FanIn {
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| !s.is_ok())
    }
}

/// Fetch from every adapter concurrently; see module docs for isolation rules.
pub async fn fetch_all(
    adapters: &[Box<dyn SourceAdapter>],
    range: &TimeRange,
    timeout: Duration,
) -> FanIn {
    ensure_metrics_described();

    let futures = adapters.iter().map(|adapter| async move {
        let name = adapter.name().to_string();
        let t0 = Instant::now();
        let guarded = AssertUnwindSafe(adapter.fetch(range)).catch_unwind();
        let result = match tokio::time::timeout(timeout, guarded).await {
            Ok(Ok(r)) => r,
            Ok(Err(_panic)) => Err(FetchError::Other(anyhow::anyhow!(
                "adapter `{name}` panicked"
            ))),
            Err(_elapsed) => Err(FetchError::Timeout {
                source_name: name.clone(),
                after: timeout,
            }),
        };
        let elapsed_ms = t0.elapsed().as_millis() as u64;
        histogram!("ingest_fetch_ms").record(elapsed_ms as f64);
        (name, result, elapsed_ms)
    });

    let mut out = FanIn::default();
    for (name, result, elapsed_ms) in join_all(futures).await {
        let status = match result {
            Ok(mut events) => {
                tracing::info!(target: "ingest", source = %name, events = events.len(), elapsed_ms, "source fetched");
                let n = events.len();
                out.events.append(&mut events);
                SourceStatus::Ok { events: n }
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!(target: "ingest", source = %name, error = %e, "source timed out");
                counter!("ingest_source_timeouts_total").increment(1);
                SourceStatus::TimedOut
            }
            Err(e) => {
                tracing::warn!(target: "ingest", source = %name, error = %e, "source failed");
                counter!("ingest_source_errors_total").increment(1);
                SourceStatus::Failed {
                    error: e.to_string(),
                }
            }
        };
        out.sources.push(SourceReport {
            name,
            status,
            elapsed_ms,
        });
    }
    out
}

/// HTML body → plain text: decode entities, strip tags, collapse whitespace.
pub fn html_to_text(s: &str) -> String {
    static RE_BREAKS: OnceCell<Regex> = OnceCell::new();
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_breaks =
        RE_BREAKS.get_or_init(|| Regex::new(r"(?i)<\s*(br|/p|/div|/li)\s*/?>").unwrap());
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)<[^>]*>").unwrap());

    let spaced = re_breaks.replace_all(s, " ");
    let stripped = re_tags.replace_all(&spaced, "");
    let decoded = html_escape::decode_html_entities(&stripped).to_string();
    collapse_ws(&decoded)
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
