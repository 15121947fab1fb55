// src/pipeline/filter.rs
//! Noise filter. Removes events that need no preparation; never edits the
//! survivors.
//!
//! Rules, each toggled in `FilterConfig`:
//! - cancelled events
//! - all-day events (holidays, OOO markers)
//! - events shorter than `min_duration_minutes`
//! - events with fewer than `min_attendees` attendees (off when 0)
//! - titles containing a noise keyword (case-insensitive substring)
//!
//! Structural validation runs before any rule, so a malformed record is
//! reported even when a rule would have dropped it anyway.

use tracing::debug;

use crate::config::FilterConfig;
use crate::error::MalformedEvent;
use crate::model::SourceEvent;
use crate::telemetry::anon_hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    Cancelled,
    AllDay,
    TooShort { minutes: i64 },
    TooFewAttendees { count: usize },
    Noise { keyword: String },
}

/// Result of filtering a batch while isolating bad records.
#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub kept: Vec<SourceEvent>,
    pub dropped: usize,
    pub malformed: Vec<MalformedEvent>,
}

#[derive(Debug, Clone)]
pub struct EventFilter {
    cfg: FilterConfig,
    noise: Vec<String>,
}

impl EventFilter {
    pub fn new(cfg: &FilterConfig) -> Self {
        let noise = cfg
            .noise_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            cfg: cfg.clone(),
            noise,
        }
    }

    /// `Ok(None)` keeps the event, `Ok(Some(reason))` drops it.
    pub fn check(&self, ev: &SourceEvent) -> Result<Option<DropReason>, MalformedEvent> {
        ev.validate()?;

        if self.cfg.exclude_cancelled && ev.is_cancelled {
            return Ok(Some(DropReason::Cancelled));
        }
        if ev.is_all_day {
            if self.cfg.exclude_all_day {
                return Ok(Some(DropReason::AllDay));
            }
        } else if self.cfg.exclude_short {
            let minutes = ev.duration_minutes();
            if minutes < self.cfg.min_duration_minutes {
                return Ok(Some(DropReason::TooShort { minutes }));
            }
        }
        if self.cfg.min_attendees > 0 && ev.attendees.len() < self.cfg.min_attendees {
            return Ok(Some(DropReason::TooFewAttendees {
                count: ev.attendees.len(),
            }));
        }
        if self.cfg.exclude_noise {
            let title = ev.title.to_lowercase();
            if let Some(k) = self.noise.iter().find(|k| title.contains(k.as_str())) {
                return Ok(Some(DropReason::Noise { keyword: k.clone() }));
            }
        }
        Ok(None)
    }

    /// Strict form: stops at the first malformed record.
    pub fn filter(&self, events: Vec<SourceEvent>) -> Result<Vec<SourceEvent>, MalformedEvent> {
        let mut kept = Vec::with_capacity(events.len());
        for ev in events {
            if self.check(&ev)?.is_none() {
                kept.push(ev);
            }
        }
        Ok(kept)
    }

    /// Isolating form used by the orchestrator: malformed records are set
    /// aside and the rest of the batch is still filtered.
    pub fn partition(&self, events: Vec<SourceEvent>) -> FilterOutcome {
        let mut out = FilterOutcome {
            kept: Vec::with_capacity(events.len()),
            ..FilterOutcome::default()
        };
        for ev in events {
            match self.check(&ev) {
                Ok(None) => out.kept.push(ev),
                Ok(Some(reason)) => {
                    debug!(
                        target: "pipeline",
                        id = %ev.id,
                        title_hash = %anon_hash(&ev.title),
                        source = %ev.source,
                        ?reason,
                        "filtered"
                    );
                    out.dropped += 1;
                }
                Err(e) => out.malformed.push(e),
            }
        }
        out
    }
}

/// Free-function form of [`EventFilter::filter`].
pub fn filter(
    events: Vec<SourceEvent>,
    rules: &FilterConfig,
) -> Result<Vec<SourceEvent>, MalformedEvent> {
    EventFilter::new(rules).filter(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;
    use chrono::{DateTime, FixedOffset, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 2, 14, h, m, 0)
            .unwrap()
    }

    fn ev(title: &str, minutes: u32) -> SourceEvent {
        SourceEvent::new(
            format!("evt-{title}"),
            Source::Google,
            title,
            at(10, 0),
            at(10, 0) + chrono::Duration::minutes(minutes.into()),
        )
    }

    #[test]
    fn short_events_are_dropped_at_the_boundary() {
        let f = EventFilter::new(&FilterConfig::default());
        assert_eq!(
            f.check(&ev("Quick ping", 4)).unwrap(),
            Some(DropReason::TooShort { minutes: 4 })
        );
        assert_eq!(f.check(&ev("Quick ping", 5)).unwrap(), None);
    }

    #[test]
    fn noise_match_is_case_insensitive_substring() {
        let f = EventFilter::new(&FilterConfig::default());
        assert!(matches!(
            f.check(&ev("Team LUNCH", 60)).unwrap(),
            Some(DropReason::Noise { .. })
        ));
        assert_eq!(f.check(&ev("Product Review", 30)).unwrap(), None);
    }

    #[test]
    fn toggles_disable_rules() {
        let cfg = FilterConfig {
            exclude_cancelled: false,
            exclude_all_day: false,
            exclude_short: false,
            exclude_noise: false,
            ..FilterConfig::default()
        };
        let f = EventFilter::new(&cfg);
        let events = vec![
            ev("Focus Time", 1).cancelled(),
            ev("Holiday", 0).all_day(),
        ];
        assert_eq!(f.filter(events).unwrap().len(), 2);
    }

    #[test]
    fn min_attendees_rule() {
        let cfg = FilterConfig {
            min_attendees: 2,
            ..FilterConfig::default()
        };
        let f = EventFilter::new(&cfg);
        let solo = ev("Solo", 30);
        let pair = ev("Pair", 30).with_attendees(["a@x.com", "b@x.com"]);
        let kept = f.filter(vec![solo, pair]).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Pair");
    }

    #[test]
    fn strict_filter_fails_fast_with_offending_id() {
        let mut bad = ev("Broken", 30);
        bad.end = at(9, 0);
        let err = filter(vec![ev("Fine", 30), bad], &FilterConfig::default()).unwrap_err();
        assert_eq!(err.id, "evt-Broken");
    }

    #[test]
    fn partition_isolates_malformed_records() {
        let mut bad = ev("Broken", 30);
        bad.end = at(9, 0);
        let out = EventFilter::new(&FilterConfig::default())
            .partition(vec![ev("Fine", 30), bad, ev("Lunch", 30)]);
        assert_eq!(out.kept.len(), 1);
        assert_eq!(out.dropped, 1);
        assert_eq!(out.malformed.len(), 1);
    }

    #[test]
    fn survivors_are_untouched() {
        let original = ev("Design review", 45)
            .with_description("  padded  ")
            .with_attendees(["B@x.com"]);
        let kept = EventFilter::new(&FilterConfig::default())
            .filter(vec![original.clone()])
            .unwrap();
        assert_eq!(kept, vec![original]);
    }
}
