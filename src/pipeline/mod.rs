// src/pipeline/mod.rs
//! Orchestrator: fetch → filter → dedupe → classify + score → sort.
//!
//! - Fetching is fan-out/fan-in (see [`crate::ingest::fetch_all`]); a broken
//!   source contributes nothing and the run continues.
//! - Everything after fan-in is synchronous and works on data local to the
//!   call. A `Pipeline` holds only validated, immutable configuration, so one
//!   instance can serve overlapping runs.
//! - Output order: score descending, then start ascending, then canonical id.

pub mod classify;
pub mod dedup;
pub mod filter;
pub mod scoring;

use chrono::Utc;
use metrics::{counter, gauge};
use std::cmp::Ordering;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::ConfigurationError;
use crate::ingest::{fetch_all, SourceAdapter, SourceReport};
use crate::model::{ProcessedEvent, SourceEvent, TimeRange};
use crate::telemetry::{anon_hash, ensure_metrics_described};

pub use classify::Classifier;
pub use dedup::{dedupe, dedupe_within, DedupGroup};
pub use filter::{DropReason, EventFilter, FilterOutcome};
pub use scoring::{Factors, Priority, Scorer};

/// Per-run counts, for logs and for callers that want more than the events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Events handed in by the sources (or by the caller of `process`).
    pub raw: usize,
    /// Dropped by a filter rule.
    pub filtered: usize,
    /// Ids of records dropped as structurally invalid.
    pub malformed: Vec<String>,
    /// Records folded into another record's group.
    pub merged: usize,
    pub output: usize,
    /// One entry per adapter, in adapter order. Empty for `process`.
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| !s.is_ok()).count()
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    filter: EventFilter,
    classifier: Classifier,
    scorer: Scorer,
    tolerance: chrono::Duration,
    fetch_timeout: Duration,
}

impl Pipeline {
    /// Validates the whole configuration up front; a broken deployment fails
    /// here, never mid-run.
    pub fn new(cfg: PipelineConfig) -> Result<Self, ConfigurationError> {
        cfg.validate()?;
        let classifier = Classifier::new(&cfg.categories)?;
        let tolerance = chrono::Duration::try_minutes(cfg.dedup.tolerance_minutes).ok_or(
            ConfigurationError::InvalidValue {
                field: "dedup.tolerance_minutes",
                reason: "out of range".into(),
            },
        )?;
        let scorer = Scorer::new(cfg.scoring, cfg.categories)?;
        Ok(Self {
            filter: EventFilter::new(&cfg.filter),
            classifier,
            scorer,
            tolerance,
            fetch_timeout: Duration::from_secs(cfg.fetch.timeout_secs),
        })
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Fetch from every adapter, then [`Pipeline::process`] the union.
    pub async fn run(
        &self,
        adapters: &[Box<dyn SourceAdapter>],
        range: &TimeRange,
    ) -> Result<Vec<ProcessedEvent>, ConfigurationError> {
        self.run_with_report(adapters, range).await.map(|(events, _)| events)
    }

    pub async fn run_with_report(
        &self,
        adapters: &[Box<dyn SourceAdapter>],
        range: &TimeRange,
    ) -> Result<(Vec<ProcessedEvent>, RunReport), ConfigurationError> {
        let fan_in = fetch_all(adapters, range, self.fetch_timeout).await;
        let (events, mut report) = self.process_with_report(fan_in.events)?;
        report.sources = fan_in.sources;

        gauge!("pipeline_last_run_ts").set(Utc::now().timestamp() as f64);
        info!(
            target: "pipeline",
            sources = report.sources.len(),
            failed_sources = report.failed_sources(),
            raw = report.raw,
            filtered = report.filtered,
            malformed = report.malformed.len(),
            merged = report.merged,
            output = report.output,
            "run complete"
        );
        Ok((events, report))
    }

    /// Pure stages over an in-memory batch. Malformed records are dropped
    /// individually; only a configuration fault fails the call.
    pub fn process(&self, events: Vec<SourceEvent>) -> Result<Vec<ProcessedEvent>, ConfigurationError> {
        self.process_with_report(events).map(|(events, _)| events)
    }

    pub fn process_with_report(
        &self,
        events: Vec<SourceEvent>,
    ) -> Result<(Vec<ProcessedEvent>, RunReport), ConfigurationError> {
        ensure_metrics_described();
        let mut report = RunReport {
            raw: events.len(),
            ..RunReport::default()
        };

        let outcome = self.filter.partition(events);
        report.filtered = outcome.dropped;
        for m in &outcome.malformed {
            warn!(target: "pipeline", id = %m.id, reason = %m.reason, "dropping malformed event");
        }
        report.malformed = outcome.malformed.into_iter().map(|m| m.id).collect();

        let kept = outcome.kept.len();
        let groups = dedupe_within(outcome.kept, self.tolerance);
        report.merged = kept - groups.len();

        let mut out = Vec::with_capacity(groups.len());
        for group in &groups {
            out.push(self.build(group)?);
        }
        out.sort_by(output_order);
        report.output = out.len();

        counter!("pipeline_raw_events_total").increment(report.raw as u64);
        counter!("pipeline_filtered_total").increment(report.filtered as u64);
        counter!("pipeline_malformed_total").increment(report.malformed.len() as u64);
        counter!("pipeline_dedup_merged_total").increment(report.merged as u64);
        counter!("pipeline_output_events_total").increment(report.output as u64);

        Ok((out, report))
    }

    /// Classify and score the canonical member, seen with the group's merged
    /// attendee set.
    fn build(&self, group: &DedupGroup) -> Result<ProcessedEvent, ConfigurationError> {
        let mut view = group.canonical().clone();
        view.attendees = group.merged_attendees();

        let category = self.classifier.classify(&view);
        let priority = self.scorer.score(&view, &category)?;
        debug!(
            target: "pipeline",
            id = %view.id,
            title_hash = %anon_hash(&view.title),
            members = group.len(),
            category = %category,
            score = priority.score,
            "scored"
        );

        Ok(ProcessedEvent {
            id: view.id,
            source: view.source,
            title: view.title,
            start: view.start,
            end: view.end,
            attendees: view.attendees,
            organizer: view.organizer,
            description: view.description,
            join_link: view.join_link,
            is_all_day: view.is_all_day,
            is_recurring: view.is_recurring,
            category,
            priority_score: priority.score,
            priority_level: priority.level,
            sources: group.sources(),
        })
    }
}

fn output_order(a: &ProcessedEvent, b: &ProcessedEvent) -> Ordering {
    b.priority_score
        .total_cmp(&a.priority_score)
        .then_with(|| a.start.cmp(&b.start))
        .then_with(|| a.id.cmp(&b.id))
}

/// One-shot convenience: validate `cfg`, fetch and process.
pub async fn run(
    adapters: &[Box<dyn SourceAdapter>],
    range: &TimeRange,
    cfg: PipelineConfig,
) -> Result<Vec<ProcessedEvent>, ConfigurationError> {
    Pipeline::new(cfg)?.run(adapters, range).await
}
