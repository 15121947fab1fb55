// src/digest.rs
//! Headline numbers for the top of a digest. Rendering lives elsewhere.

use serde::Serialize;

use crate::model::{PriorityLevel, ProcessedEvent, Source};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DigestSummary {
    pub total_meetings: usize,
    /// Sum of durations, in hours.
    pub total_hours: f64,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Distinct sources across all events, in `Source` order.
    pub sources: Vec<Source>,
}

impl DigestSummary {
    pub fn from_events(events: &[ProcessedEvent]) -> Self {
        let mut s = DigestSummary {
            total_meetings: events.len(),
            ..Default::default()
        };
        let mut minutes = 0i64;
        for ev in events {
            minutes += ev.duration_minutes();
            match ev.priority_level {
                PriorityLevel::High => s.high += 1,
                PriorityLevel::Medium => s.medium += 1,
                PriorityLevel::Low => s.low += 1,
            }
            s.sources.extend(ev.sources.iter().copied());
        }
        s.sources.sort();
        s.sources.dedup();
        s.total_hours = minutes as f64 / 60.0;
        s
    }

    /// One-line headline, e.g. `3 meetings, 2.5 h (1 high, 1 medium, 1 low)`.
    pub fn headline(&self) -> String {
        format!(
            "{} meeting{}, {:.1} h ({} high, {} medium, {} low)",
            self.total_meetings,
            if self.total_meetings == 1 { "" } else { "s" },
            self.total_hours,
            self.high,
            self.medium,
            self.low
        )
    }
}
