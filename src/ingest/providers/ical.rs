// src/ingest/providers/ical.rs
//! iCalendar (RFC 5545) subscription feeds: course timetables, club
//! calendars, any `.ics` URL.
//!
//! Supported subset: folded lines, `VEVENT` with `UID`, `SUMMARY`, `DTSTART`,
//! `DTEND` / `DURATION`, `DESCRIPTION`, `ORGANIZER`, `ATTENDEE`, `STATUS`,
//! `RRULE` / `RECURRENCE-ID`, `URL`. Recurrence rules mark an event as
//! recurring but are not expanded; only the stored instance is reported.
//!
//! Times: `...Z` is UTC, `TZID=<IANA name>` is resolved with `chrono-tz`,
//! floating times and unknown zones use the provider's default offset.

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::collections::BTreeSet;

use super::{midnight, utc, Payload};
use crate::error::FetchError;
use crate::ingest::types::SourceAdapter;
use crate::model::{Source, SourceEvent, TimeRange};
use crate::telemetry::anon_hash;

pub struct IcalProvider {
    name: String,
    source: Source,
    payload: Payload,
    default_offset: FixedOffset,
}

impl IcalProvider {
    pub fn new(name: impl Into<String>, source: Source, payload: Payload) -> Self {
        Self {
            name: name.into(),
            source,
            payload,
            default_offset: utc(),
        }
    }

    pub fn from_fixture(name: &str, source: Source, ics: &str) -> Self {
        Self::new(name, source, Payload::Inline(ics.to_string()))
    }

    pub fn with_default_offset(mut self, offset: FixedOffset) -> Self {
        self.default_offset = offset;
        self
    }

    pub fn parse(&self, body: &str) -> Result<Vec<SourceEvent>, FetchError> {
        parse_ics(body, self.source, &self.name, self.default_offset)
    }
}

#[async_trait]
impl SourceAdapter for IcalProvider {
    async fn fetch(&self, range: &TimeRange) -> Result<Vec<SourceEvent>, FetchError> {
        let body = self.payload.load(&[]).await?;
        let events = self.parse(&body)?;
        Ok(events
            .into_iter()
            .filter(|e| range.overlaps(&e.start, &e.end))
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// One content line: `NAME;PARAM=V;...:VALUE`.
#[derive(Debug)]
struct Prop {
    name: String,
    params: Vec<(String, String)>,
    value: String,
}

impl Prop {
    fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
struct RawEvent {
    uid: Option<String>,
    summary: Option<String>,
    dtstart: Option<Prop>,
    dtend: Option<Prop>,
    duration: Option<String>,
    description: Option<String>,
    organizer: Option<String>,
    attendees: BTreeSet<String>,
    cancelled: bool,
    recurring: bool,
    url: Option<String>,
}

pub fn parse_ics(
    body: &str,
    source: Source,
    label: &str,
    default_offset: FixedOffset,
) -> Result<Vec<SourceEvent>, FetchError> {
    if !body.contains("BEGIN:VCALENDAR") {
        return Err(FetchError::Parse(format!("{label}: not an iCalendar document")));
    }

    let mut out = Vec::new();
    let mut current: Option<RawEvent> = None;
    // VALARM and friends nest inside VEVENT; their properties are not the event's.
    let mut nested = 0usize;
    for line in unfold(body) {
        let Some(prop) = parse_line(&line) else {
            continue;
        };
        let is_vevent = prop.value.trim().eq_ignore_ascii_case("VEVENT");
        match prop.name.as_str() {
            "BEGIN" if is_vevent => {
                current = Some(RawEvent::default());
                nested = 0;
            }
            "BEGIN" => nested += 1,
            "END" if !is_vevent => nested = nested.saturating_sub(1),
            "END" => {
                if let Some(raw) = current.take() {
                    match build_event(raw, source, label, default_offset) {
                        Some(ev) => out.push(ev),
                        None => tracing::debug!(target: "ingest", source = label, "skipping VEVENT without usable DTSTART"),
                    }
                }
            }
            _ if nested > 0 => {}
            _ => {
                if let Some(raw) = current.as_mut() {
                    apply(raw, prop);
                }
            }
        }
    }
    Ok(out)
}

fn apply(raw: &mut RawEvent, prop: Prop) {
    match prop.name.as_str() {
        "UID" => raw.uid = Some(prop.value.trim().to_string()),
        "SUMMARY" => raw.summary = Some(unescape(&prop.value)),
        "DESCRIPTION" => raw.description = Some(unescape(&prop.value)),
        "DTSTART" => raw.dtstart = Some(prop),
        "DTEND" => raw.dtend = Some(prop),
        "DURATION" => raw.duration = Some(prop.value),
        "ORGANIZER" => raw.organizer = mailto(&prop.value),
        "ATTENDEE" => {
            if let Some(a) = mailto(&prop.value) {
                raw.attendees.insert(a);
            }
        }
        "STATUS" => raw.cancelled = prop.value.trim().eq_ignore_ascii_case("CANCELLED"),
        "RRULE" | "RDATE" | "RECURRENCE-ID" => raw.recurring = true,
        "URL" => raw.url = Some(prop.value.trim().to_string()),
        _ => {}
    }
}

fn build_event(
    raw: RawEvent,
    source: Source,
    label: &str,
    default_offset: FixedOffset,
) -> Option<SourceEvent> {
    let (start, is_all_day) = parse_time(raw.dtstart.as_ref()?, default_offset)?;
    let end = raw
        .dtend
        .as_ref()
        .and_then(|p| parse_time(p, default_offset))
        .map(|(t, _)| t)
        .or_else(|| raw.duration.as_deref().and_then(parse_duration).map(|d| start + d))
        .unwrap_or_else(|| {
            if is_all_day {
                start + Duration::days(1)
            } else {
                start + Duration::hours(1)
            }
        });

    let title = raw
        .summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "(No Title)".to_string());

    let id = raw.uid.filter(|u| !u.is_empty()).unwrap_or_else(|| {
        format!(
            "ical-{}",
            anon_hash(&format!("{label}|{title}|{}", start.to_rfc3339()))
        )
    });

    Some(SourceEvent {
        id,
        source,
        title,
        start,
        end,
        attendees: raw.attendees,
        organizer: raw.organizer,
        description: raw.description.unwrap_or_default().trim().to_string(),
        join_link: raw.url,
        is_all_day,
        is_cancelled: raw.cancelled,
        is_recurring: raw.recurring,
    })
}

/// Join folded continuation lines (leading space or tab).
fn unfold(body: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in body.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(rest) = line.strip_prefix([' ', '\t']) {
            if let Some(last) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    lines
}

fn parse_line(line: &str) -> Option<Prop> {
    // The value starts at the first ':' outside a quoted parameter value.
    let mut in_quotes = false;
    let mut colon = None;
    for (i, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ':' if !in_quotes => {
                colon = Some(i);
                break;
            }
            _ => {}
        }
    }
    let colon = colon?;
    let (head, value) = (&line[..colon], &line[colon + 1..]);
    let mut parts = head.split(';');
    let name = parts.next()?.trim().to_ascii_uppercase();
    let params = parts
        .filter_map(|p| p.split_once('='))
        .map(|(k, v)| (k.trim().to_ascii_uppercase(), v.trim().trim_matches('"').to_string()))
        .collect();
    Some(Prop {
        name,
        params,
        value: value.to_string(),
    })
}

fn parse_time(prop: &Prop, default_offset: FixedOffset) -> Option<(DateTime<FixedOffset>, bool)> {
    let value = prop.value.trim();
    let date_only = prop
        .param("VALUE")
        .is_some_and(|v| v.eq_ignore_ascii_case("DATE"))
        || value.len() == 8;
    if date_only {
        let d = NaiveDate::parse_from_str(value, "%Y%m%d").ok()?;
        return Some((midnight(d, default_offset)?, true));
    }

    if let Some(utc_value) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(utc_value, "%Y%m%dT%H%M%S").ok()?;
        return Some((Utc.from_utc_datetime(&naive).fixed_offset(), false));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?;
    if let Some(tz) = prop.param("TZID").and_then(|t| t.parse::<chrono_tz::Tz>().ok()) {
        if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
            return Some((dt.fixed_offset(), false));
        }
    }
    Some((default_offset.from_local_datetime(&naive).single()?, false))
}

/// `P[nW][nD][T[nH][nM][nS]]`; negative durations are rejected.
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim().strip_prefix('+').unwrap_or(s.trim());
    let body = s.strip_prefix('P')?;
    let mut total = Duration::zero();
    let mut num = String::new();
    let mut in_time = false;
    for ch in body.chars() {
        match ch {
            'T' => in_time = true,
            '0'..='9' => num.push(ch),
            unit => {
                let n: i64 = num.parse().ok()?;
                num.clear();
                total += match (unit, in_time) {
                    ('W', false) => Duration::weeks(n),
                    ('D', false) => Duration::days(n),
                    ('H', true) => Duration::hours(n),
                    ('M', true) => Duration::minutes(n),
                    ('S', true) => Duration::seconds(n),
                    _ => return None,
                };
            }
        }
    }
    num.is_empty().then_some(total)
}

fn mailto(value: &str) -> Option<String> {
    let v = value.trim();
    let addr = match v.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("mailto:") => &v[7..],
        _ => v,
    };
    let addr = addr.trim();
    (!addr.is_empty()).then(|| addr.to_string())
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
