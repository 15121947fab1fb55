// src/ingest/providers/google.rs
//! Google Calendar `events.list` JSON → `SourceEvent`.
//!
//! - `start.date` (no `dateTime`) marks an all-day event
//! - `recurringEventId` marks an instance of a recurring series
//! - join link: `hangoutLink`, else the first video `conferenceData` entry point

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use serde::Deserialize;

use super::{midnight, parse_timestamp, utc, Payload};
use crate::error::FetchError;
use crate::ingest::types::SourceAdapter;
use crate::model::{Source, SourceEvent, TimeRange};

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    id: Option<String>,
    summary: Option<String>,
    status: Option<String>,
    start: Option<When>,
    end: Option<When>,
    description: Option<String>,
    #[serde(default)]
    attendees: Vec<Person>,
    organizer: Option<Person>,
    recurring_event_id: Option<String>,
    hangout_link: Option<String>,
    conference_data: Option<ConferenceData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct When {
    date_time: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Person {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConferenceData {
    #[serde(default)]
    entry_points: Vec<EntryPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryPoint {
    entry_point_type: Option<String>,
    uri: Option<String>,
}

pub struct GoogleCalendarProvider {
    payload: Payload,
    /// Offset used to anchor all-day dates.
    all_day_offset: FixedOffset,
}

impl GoogleCalendarProvider {
    pub fn from_fixture(json: &str) -> Self {
        Self::new(Payload::Inline(json.to_string()))
    }

    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            all_day_offset: utc(),
        }
    }

    pub fn with_all_day_offset(mut self, offset: FixedOffset) -> Self {
        self.all_day_offset = offset;
        self
    }

    pub fn parse(&self, body: &str) -> Result<Vec<SourceEvent>, FetchError> {
        let list: EventList = serde_json::from_str(body)?;
        let mut out = Vec::with_capacity(list.items.len());
        for item in list.items {
            match self.convert(item) {
                Some(ev) => out.push(ev),
                None => tracing::warn!(target: "ingest", source = "google", "skipping event without id or start"),
            }
        }
        Ok(out)
    }

    fn convert(&self, it: Item) -> Option<SourceEvent> {
        let id = it.id.filter(|s| !s.trim().is_empty())?;
        let start_when = it.start?;
        let is_all_day = start_when.date_time.is_none() && start_when.date.is_some();

        let start = self.resolve(&start_when)?;
        let end = it
            .end
            .as_ref()
            .and_then(|w| self.resolve(w))
            .unwrap_or_else(|| {
                if is_all_day {
                    start + Duration::days(1)
                } else {
                    start + Duration::hours(1)
                }
            });

        let join_link = it.hangout_link.or_else(|| {
            it.conference_data.and_then(|cd| {
                cd.entry_points
                    .into_iter()
                    .find(|ep| ep.entry_point_type.as_deref() == Some("video"))
                    .and_then(|ep| ep.uri)
            })
        });

        let title = it
            .summary
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "(No Title)".to_string());

        Some(SourceEvent {
            id,
            source: Source::Google,
            title,
            start,
            end,
            attendees: it.attendees.into_iter().filter_map(|p| p.email).collect(),
            organizer: it.organizer.and_then(|p| p.email),
            description: it.description.unwrap_or_default(),
            join_link,
            is_all_day,
            is_cancelled: it.status.as_deref() == Some("cancelled"),
            is_recurring: it.recurring_event_id.is_some(),
        })
    }

    fn resolve(&self, w: &When) -> Option<DateTime<FixedOffset>> {
        if let Some(dt) = w.date_time.as_deref() {
            return parse_timestamp(dt, utc());
        }
        let d = NaiveDate::parse_from_str(w.date.as_deref()?, "%Y-%m-%d").ok()?;
        midnight(d, self.all_day_offset)
    }
}

#[async_trait]
impl SourceAdapter for GoogleCalendarProvider {
    async fn fetch(&self, range: &TimeRange) -> Result<Vec<SourceEvent>, FetchError> {
        #[cfg(feature = "ingest-http")]
        let query = {
            let mut q = super::range_query(range, "timeMin", "timeMax");
            q.push(("singleEvents", "true".to_string()));
            q.push(("orderBy", "startTime".to_string()));
            q
        };
        #[cfg(not(feature = "ingest-http"))]
        let query = Vec::new();

        let body = self.payload.load(&query).await?;
        let events = self.parse(&body)?;
        Ok(events
            .into_iter()
            .filter(|e| range.overlaps(&e.start, &e.end))
            .collect())
    }

    fn name(&self) -> &str {
        "google"
    }
}
