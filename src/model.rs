//! Core data types shared by every pipeline stage.
//!
//! `SourceEvent` is what an adapter hands in, `ProcessedEvent` is what the
//! pipeline hands out. Nothing in between is visible to downstream consumers.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::MalformedEvent;

/// Origin system of an event. Declaration order doubles as the stable
/// ordering used for provenance lists and deterministic tie-breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Google,
    Outlook,
    Teams,
    Ical,
    University,
    Manual,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Google => "google",
            Source::Outlook => "outlook",
            Source::Teams => "teams",
            Source::Ical => "ical",
            Source::University => "university",
            Source::Manual => "manual",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One event as reported by one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEvent {
    /// Source-local identifier; only unique within `source`.
    pub id: String,
    pub source: Source,
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    #[serde(default)]
    pub attendees: BTreeSet<String>,
    #[serde(default)]
    pub organizer: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub join_link: Option<String>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default)]
    pub is_recurring: bool,
}

impl SourceEvent {
    /// Minimal timed event; the remaining fields start empty/false.
    pub fn new(
        id: impl Into<String>,
        source: Source,
        title: impl Into<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: id.into(),
            source,
            title: title.into(),
            start,
            end,
            attendees: BTreeSet::new(),
            organizer: None,
            description: String::new(),
            join_link: None,
            is_all_day: false,
            is_cancelled: false,
            is_recurring: false,
        }
    }

    pub fn with_attendees<I, S>(mut self, attendees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attendees = attendees.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_organizer(mut self, organizer: impl Into<String>) -> Self {
        self.organizer = Some(organizer.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_join_link(mut self, link: impl Into<String>) -> Self {
        self.join_link = Some(link.into());
        self
    }

    pub fn all_day(mut self) -> Self {
        self.is_all_day = true;
        self
    }

    pub fn cancelled(mut self) -> Self {
        self.is_cancelled = true;
        self
    }

    pub fn recurring(mut self) -> Self {
        self.is_recurring = true;
        self
    }

    /// Whole minutes between start and end, never negative.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes().max(0)
    }

    /// Structural check: a non-empty id and title, and `end >= start`
    /// unless the event is all-day.
    pub fn validate(&self) -> Result<(), MalformedEvent> {
        if self.id.trim().is_empty() {
            return Err(MalformedEvent::new(&self.id, "missing id"));
        }
        if self.title.trim().is_empty() {
            return Err(MalformedEvent::new(&self.id, "missing title"));
        }
        if !self.is_all_day && self.end < self.start {
            return Err(MalformedEvent::new(&self.id, "end precedes start"));
        }
        Ok(())
    }
}

/// Meeting category label. The set of labels is configuration data, so this
/// is an open newtype rather than a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    High,
    Medium,
    Low,
}

impl PriorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLevel::High => "high",
            PriorityLevel::Medium => "medium",
            PriorityLevel::Low => "low",
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Pipeline output unit: the canonical member's fields, the merged attendee
/// set of its dedup group, the assigned label and priority, and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedEvent {
    pub id: String,
    pub source: Source,
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub attendees: BTreeSet<String>,
    pub organizer: Option<String>,
    pub description: String,
    pub join_link: Option<String>,
    pub is_all_day: bool,
    pub is_recurring: bool,
    pub category: Category,
    pub priority_score: f64,
    pub priority_level: PriorityLevel,
    /// Distinct sources that reported this meeting, in `Source` order.
    pub sources: Vec<Source>,
}

impl ProcessedEvent {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes().max(0)
    }

    pub fn attendee_count(&self) -> usize {
        self.attendees.len()
    }
}

/// Half-open fetch window handed to every adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// `[now, now + hours)`.
    pub fn lookahead(now: DateTime<Utc>, hours: u32) -> Self {
        Self {
            start: now,
            end: now + Duration::hours(i64::from(hours)),
        }
    }

    /// True when `[start, end]` intersects this window. Zero-length events
    /// at the window start still count.
    pub fn overlaps<Tz: chrono::TimeZone>(&self, start: &DateTime<Tz>, end: &DateTime<Tz>) -> bool {
        let s = start.with_timezone(&Utc);
        let e = end.with_timezone(&Utc);
        s < self.end && e >= self.start
    }
}
