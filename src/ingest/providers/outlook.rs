// src/ingest/providers/outlook.rs
//! Microsoft Graph calendar events (Outlook + Teams) → `SourceEvent`.
//!
//! Graph returns naive timestamps with up to 7 fractional digits; they are
//! read as UTC. Online meetings are reported as `teams`, everything else as
//! `outlook`. HTML bodies are reduced to plain text.

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Timelike};
use serde::Deserialize;

use super::{parse_timestamp, utc, Payload};
use crate::error::FetchError;
use crate::ingest::html_to_text;
use crate::ingest::types::SourceAdapter;
use crate::model::{Source, SourceEvent, TimeRange};

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    value: Vec<GraphEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphEvent {
    id: Option<String>,
    subject: Option<String>,
    start: Option<GraphTime>,
    end: Option<GraphTime>,
    body: Option<Body>,
    #[serde(default)]
    attendees: Vec<Attendee>,
    organizer: Option<Attendee>,
    #[serde(default)]
    is_online_meeting: bool,
    online_meeting: Option<OnlineMeeting>,
    recurrence: Option<serde_json::Value>,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    is_cancelled: bool,
    is_all_day: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphTime {
    date_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Body {
    content_type: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Attendee {
    email_address: Option<EmailAddress>,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OnlineMeeting {
    join_url: Option<String>,
}

pub struct OutlookProvider {
    payload: Payload,
}

impl OutlookProvider {
    pub fn from_fixture(json: &str) -> Self {
        Self::new(Payload::Inline(json.to_string()))
    }

    pub fn new(payload: Payload) -> Self {
        Self { payload }
    }

    pub fn parse(&self, body: &str) -> Result<Vec<SourceEvent>, FetchError> {
        let page: Page = serde_json::from_str(body)?;
        let mut out = Vec::with_capacity(page.value.len());
        for raw in page.value {
            match convert(raw) {
                Some(ev) => out.push(ev),
                None => tracing::warn!(target: "ingest", source = "outlook", "skipping event without id or times"),
            }
        }
        Ok(out)
    }
}

fn convert(raw: GraphEvent) -> Option<SourceEvent> {
    let id = raw.id.filter(|s| !s.trim().is_empty())?;
    let start = parse_timestamp(&raw.start?.date_time, utc())?;
    let end = match raw.end {
        Some(t) => parse_timestamp(&t.date_time, utc())?,
        None => start + Duration::hours(1),
    };

    let is_all_day = raw
        .is_all_day
        .unwrap_or_else(|| spans_whole_days(&start, &end));

    let description = raw
        .body
        .map(|b| {
            let content = b.content.unwrap_or_default();
            if b.content_type.as_deref().is_some_and(|t| t.eq_ignore_ascii_case("html")) {
                html_to_text(&content)
            } else {
                content.trim().to_string()
            }
        })
        .unwrap_or_default();

    let email = |a: Attendee| a.email_address.and_then(|e| e.address).filter(|s| !s.is_empty());

    let title = raw
        .subject
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "(No Subject)".to_string());

    Some(SourceEvent {
        id,
        source: if raw.is_online_meeting {
            Source::Teams
        } else {
            Source::Outlook
        },
        title,
        start,
        end,
        attendees: raw.attendees.into_iter().filter_map(email).collect(),
        organizer: raw.organizer.and_then(email),
        description,
        join_link: raw.online_meeting.and_then(|m| m.join_url),
        is_all_day,
        is_cancelled: raw.is_cancelled,
        is_recurring: raw.recurrence.is_some_and(|r| !r.is_null())
            || matches!(raw.kind.as_deref(), Some("occurrence") | Some("exception")),
    })
}

/// Midnight-to-midnight spanning at least one day.
fn spans_whole_days(start: &DateTime<FixedOffset>, end: &DateTime<FixedOffset>) -> bool {
    let at_midnight = |t: &DateTime<FixedOffset>| t.hour() == 0 && t.minute() == 0;
    at_midnight(start) && at_midnight(end) && (*end - *start) >= Duration::days(1)
}

#[async_trait]
impl SourceAdapter for OutlookProvider {
    async fn fetch(&self, range: &TimeRange) -> Result<Vec<SourceEvent>, FetchError> {
        #[cfg(feature = "ingest-http")]
        let query = super::range_query(range, "startDateTime", "endDateTime");
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
        "outlook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn february() -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
        )
    }

    const SAMPLE: &str = r#"{
      "value": [
        {
          "id": "AAMk1",
          "subject": "Quarterly review",
          "start": {"dateTime": "2026-02-14T15:00:00.0000000", "timeZone": "UTC"},
          "end": {"dateTime": "2026-02-14T16:00:00.0000000", "timeZone": "UTC"},
          "body": {"contentType": "html", "content": "<p>Agenda:&nbsp;numbers</p>"},
          "attendees": [{"emailAddress": {"address": "kim@client.com", "name": "Kim"}}],
          "organizer": {"emailAddress": {"address": "me@corp.com"}},
          "isOnlineMeeting": true,
          "onlineMeeting": {"joinUrl": "https://teams.microsoft.com/l/meetup-join/1"},
          "recurrence": null,
          "isCancelled": false
        },
        {
          "id": "AAMk2",
          "subject": "Offsite",
          "start": {"dateTime": "2026-02-15T00:00:00.0000000"},
          "end": {"dateTime": "2026-02-16T00:00:00.0000000"},
          "recurrence": {"pattern": {"type": "weekly"}}
        }
      ]
    }"#;

    #[tokio::test]
    async fn parses_graph_events() {
        let evs = OutlookProvider::from_fixture(SAMPLE)
            .fetch(&february())
            .await
            .unwrap();
        assert_eq!(evs.len(), 2);

        let review = &evs[0];
        assert_eq!(review.source, Source::Teams);
        assert_eq!(review.description, "Agenda: numbers");
        assert_eq!(review.duration_minutes(), 60);
        assert!(!review.is_recurring);
        assert_eq!(
            review.join_link.as_deref(),
            Some("https://teams.microsoft.com/l/meetup-join/1")
        );

        let offsite = &evs[1];
        assert_eq!(offsite.source, Source::Outlook);
        assert!(offsite.is_all_day);
        assert!(offsite.is_recurring);
        assert_eq!(offsite.title, "Offsite");
    }
}
