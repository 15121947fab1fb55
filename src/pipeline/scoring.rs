// src/pipeline/scoring.rs
//! Priority scoring.
//!
//! Six factors, each in [0,1], combined with weights that sum to 1.0:
//! - `category`      : base weight of the assigned category
//! - `attendees`     : min(count, cap) / cap
//! - `duration`      : min(minutes, cap) / cap
//! - `external`      : share of attendees outside the organizer's domain
//! - `non_recurring` : 1 for one-off meetings
//! - `agenda`        : 1 when the description is longer than the agenda threshold
//!
//! Because the weights are validated at construction, the sum cannot leave
//! [0,1] beyond float rounding. A larger excursion is reported as a
//! configuration error instead of being clamped.

use serde::Serialize;

use crate::config::scoring::WEIGHT_SUM_EPSILON;
use crate::config::{CategoryTable, ScoringConfig};
use crate::error::ConfigurationError;
use crate::model::{Category, PriorityLevel, SourceEvent};

/// Normalized factor values before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Factors {
    pub category: f64,
    pub attendees: f64,
    pub duration: f64,
    pub external: f64,
    pub non_recurring: f64,
    pub agenda: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Priority {
    pub score: f64,
    pub level: PriorityLevel,
}

#[derive(Debug, Clone)]
pub struct Scorer {
    cfg: ScoringConfig,
    table: CategoryTable,
}

impl Scorer {
    pub fn new(cfg: ScoringConfig, table: CategoryTable) -> Result<Self, ConfigurationError> {
        cfg.validate()?;
        table.validate()?;
        Ok(Self { cfg, table })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.cfg
    }

    /// Factor values for an event that already carries its merged attendee
    /// set. Unknown categories use the default category's weight.
    pub fn factors(&self, event: &SourceEvent, category: &Category) -> Factors {
        let category_weight = self
            .table
            .weight_for(category)
            .or_else(|| self.table.weight_for(&self.table.fallback()))
            .unwrap_or(0.0);

        let attendee_cap = f64::from(self.cfg.attendee_cap);
        let attendees = (event.attendees.len() as f64).min(attendee_cap) / attendee_cap;

        let duration_cap = f64::from(self.cfg.duration_cap_minutes);
        let duration = (event.duration_minutes() as f64).min(duration_cap) / duration_cap;

        let agenda_len = event.description.trim().chars().count();

        Factors {
            category: clamp01(category_weight),
            attendees: clamp01(attendees),
            duration: clamp01(duration),
            external: clamp01(external_share(event)),
            non_recurring: if event.is_recurring { 0.0 } else { 1.0 },
            agenda: if agenda_len > self.cfg.agenda_min_chars {
                1.0
            } else {
                0.0
            },
        }
    }

    pub fn weighted_sum(&self, f: &Factors) -> f64 {
        let w = &self.cfg.weights;
        w.category * f.category
            + w.attendees * f.attendees
            + w.duration * f.duration
            + w.external * f.external
            + w.non_recurring * f.non_recurring
            + w.agenda * f.agenda
    }

    pub fn score(&self, event: &SourceEvent, category: &Category) -> Result<Priority, ConfigurationError> {
        let raw = self.weighted_sum(&self.factors(event, category));
        if !(-WEIGHT_SUM_EPSILON..=1.0 + WEIGHT_SUM_EPSILON).contains(&raw) {
            return Err(ConfigurationError::ScoreOutOfRange { score: raw });
        }
        // Absorb float rounding from the weight sum; real excursions errored above.
        let score = raw.clamp(0.0, 1.0);
        Ok(Priority {
            score,
            level: self.level_for(score),
        })
    }

    pub fn level_for(&self, score: f64) -> PriorityLevel {
        let t = &self.cfg.thresholds;
        if score >= t.high {
            PriorityLevel::High
        } else if score >= t.medium {
            PriorityLevel::Medium
        } else {
            PriorityLevel::Low
        }
    }
}

/// Free-function form: validates, then scores once.
pub fn score(
    event: &SourceEvent,
    category: &Category,
    weights: &ScoringConfig,
    table: &CategoryTable,
) -> Result<Priority, ConfigurationError> {
    Scorer::new(weights.clone(), table.clone())?.score(event, category)
}

fn domain_of(addr: &str) -> Option<String> {
    let (_, d) = addr.trim().rsplit_once('@')?;
    let d = d.trim().to_ascii_lowercase();
    (!d.is_empty()).then_some(d)
}

/// Share of attendees whose domain differs from the organizer's. Attendees
/// without a parsable domain count toward the total but never as external.
fn external_share(event: &SourceEvent) -> f64 {
    let Some(org) = event.organizer.as_deref().and_then(domain_of) else {
        return 0.0;
    };
    if event.attendees.is_empty() {
        return 0.0;
    }
    let external = event
        .attendees
        .iter()
        .filter_map(|a| domain_of(a))
        .filter(|d| *d != org)
        .count();
    external as f64 / event.attendees.len() as f64
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}
