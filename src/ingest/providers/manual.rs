// src/ingest/providers/manual.rs
//! Hand-entered meetings kept in a local JSON file.
//!
//! ```json
//! [{"id": "42", "title": "Coffee with Sam", "start_time": "2026-02-14T10:00:00-05:00",
//!   "end_time": "2026-02-14T10:30:00-05:00", "attendees": ["sam@acme.com"],
//!   "description": "", "meeting_link": null, "is_recurring": false}]
//! ```
//!
//! Ids are prefixed with `manual-`. Records that cannot be read are skipped
//! one by one; only a document that is not a JSON array fails the fetch.

use async_trait::async_trait;
use chrono::FixedOffset;
use serde::Deserialize;

use super::{parse_timestamp, utc, Payload};
use crate::error::FetchError;
use crate::ingest::types::SourceAdapter;
use crate::model::{Source, SourceEvent, TimeRange};

#[derive(Debug, Deserialize)]
struct ManualRecord {
    id: serde_json::Value,
    title: String,
    start_time: String,
    end_time: String,
    #[serde(default)]
    attendees: Vec<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    meeting_link: Option<String>,
    #[serde(default)]
    organizer: Option<String>,
    #[serde(default)]
    is_recurring: bool,
}

pub struct ManualMeetingsProvider {
    payload: Payload,
    default_offset: FixedOffset,
}

impl ManualMeetingsProvider {
    pub fn from_fixture(json: &str) -> Self {
        Self::new(Payload::Inline(json.to_string()))
    }

    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            default_offset: utc(),
        }
    }

    /// Offset applied to timestamps written without one.
    pub fn with_default_offset(mut self, offset: FixedOffset) -> Self {
        self.default_offset = offset;
        self
    }

    pub fn parse(&self, body: &str) -> Result<Vec<SourceEvent>, FetchError> {
        let records: Vec<serde_json::Value> = serde_json::from_str(body)?;
        let mut out = Vec::with_capacity(records.len());
        for (i, value) in records.into_iter().enumerate() {
            match serde_json::from_value::<ManualRecord>(value) {
                Ok(rec) => match self.convert(rec) {
                    Some(ev) => out.push(ev),
                    None => tracing::warn!(target: "ingest", source = "manual", index = i, "skipping record with unreadable times or id"),
                },
                Err(e) => tracing::warn!(target: "ingest", source = "manual", index = i, error = %e, "skipping malformed record"),
            }
        }
        Ok(out)
    }

    fn convert(&self, rec: ManualRecord) -> Option<SourceEvent> {
        let raw_id = match rec.id {
            serde_json::Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let start = parse_timestamp(&rec.start_time, self.default_offset)?;
        let end = parse_timestamp(&rec.end_time, self.default_offset)?;

        let mut ev = SourceEvent::new(format!("manual-{raw_id}"), Source::Manual, rec.title.trim(), start, end)
            .with_attendees(rec.attendees.into_iter().filter(|a| !a.trim().is_empty()))
            .with_description(rec.description.unwrap_or_default().trim());
        if let Some(link) = rec.meeting_link.filter(|l| !l.trim().is_empty()) {
            ev = ev.with_join_link(link);
        }
        if let Some(org) = rec.organizer.filter(|o| !o.trim().is_empty()) {
            ev = ev.with_organizer(org);
        }
        if rec.is_recurring {
            ev = ev.recurring();
        }
        Some(ev)
    }
}

#[async_trait]
impl SourceAdapter for ManualMeetingsProvider {
    async fn fetch(&self, range: &TimeRange) -> Result<Vec<SourceEvent>, FetchError> {
        let body = self.payload.load(&[]).await?;
        let events = self.parse(&body)?;
        Ok(events
            .into_iter()
            .filter(|e| range.overlaps(&e.start, &e.end))
            .collect())
    }

    fn name(&self) -> &str {
        "manual"
    }
}
