// src/ingest/providers/mod.rs
//! Concrete source adapters plus the payload plumbing they share.
//!
//! Each adapter reads its raw document from a [`Payload`]: an inline string
//! (tests, fixtures), a local file, or with the `ingest-http` feature an HTTP
//! endpoint. Parsing never depends on where the bytes came from.

pub mod google;
pub mod ical;
pub mod manual;
pub mod outlook;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use std::path::PathBuf;

use crate::config::{FeedSource, SourcesConfig};
use crate::error::FetchError;
use crate::ingest::types::SourceAdapter;
#[cfg(feature = "ingest-http")]
use crate::model::TimeRange;

pub use google::GoogleCalendarProvider;
pub use ical::IcalProvider;
pub use manual::ManualMeetingsProvider;
pub use outlook::OutlookProvider;

pub enum Payload {
    Inline(String),
    File(PathBuf),
    #[cfg(feature = "ingest-http")]
    Http {
        url: String,
        client: reqwest::Client,
        bearer: Option<String>,
    },
}

impl Payload {
    #[cfg(feature = "ingest-http")]
    pub fn http(url: impl Into<String>, bearer: Option<String>) -> Self {
        Payload::Http {
            url: url.into(),
            client: reqwest::Client::new(),
            bearer,
        }
    }

    /// Raw document body. `query` is only used by the HTTP mode.
    #[cfg_attr(not(feature = "ingest-http"), allow(unused_variables))]
    pub async fn load(&self, query: &[(&str, String)]) -> Result<String, FetchError> {
        match self {
            Payload::Inline(s) => Ok(s.clone()),
            Payload::File(p) => Ok(tokio::fs::read_to_string(p).await?),
            #[cfg(feature = "ingest-http")]
            Payload::Http {
                url,
                client,
                bearer,
            } => {
                let mut req = client.get(url.as_str()).query(query);
                if let Some(token) = bearer {
                    req = req.bearer_auth(token);
                }
                let resp = req
                    .send()
                    .await
                    .map_err(|e| FetchError::Http(e.to_string()))?;
                let status = resp.status();
                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN
                {
                    return Err(FetchError::Auth(format!("{url} answered {status}")));
                }
                if !status.is_success() {
                    return Err(FetchError::Http(format!("{url} answered {status}")));
                }
                resp.text()
                    .await
                    .map_err(|e| FetchError::Http(e.to_string()))
            }
        }
    }
}

impl Payload {
    /// File first, then URL. A URL without the `ingest-http` feature is unusable.
    fn from_feed(label: &str, path: Option<&PathBuf>, url: Option<&str>, token_env: Option<&str>) -> Option<Self> {
        if let Some(p) = path {
            return Some(Payload::File(p.clone()));
        }
        let url = url?;
        #[cfg(feature = "ingest-http")]
        {
            let bearer = token_env.and_then(|k| std::env::var(k).ok());
            if token_env.is_some() && bearer.is_none() {
                tracing::warn!(target: "ingest", source = label, "token env var is not set; calling without auth");
            }
            Some(Payload::http(url, bearer))
        }
        #[cfg(not(feature = "ingest-http"))]
        {
            let _ = token_env;
            tracing::warn!(target: "ingest", source = label, url, "URL source needs the `ingest-http` feature; skipping");
            None
        }
    }
}

/// Adapters for every enabled source in `cfg`, in a fixed order:
/// google, outlook, iCal feeds (as listed), manual.
pub fn from_config(cfg: &SourcesConfig) -> Vec<Box<dyn SourceAdapter>> {
    let offset = cfg.default_offset().unwrap_or_else(utc);
    let feed = |label: &str, f: &FeedSource| {
        if !f.enabled {
            return None;
        }
        Payload::from_feed(label, f.path.as_ref(), f.url.as_deref(), f.token_env.as_deref())
    };

    let mut out: Vec<Box<dyn SourceAdapter>> = Vec::new();
    if let Some(p) = cfg.google.as_ref().and_then(|f| feed("google", f)) {
        out.push(Box::new(GoogleCalendarProvider::new(p).with_all_day_offset(offset)));
    }
    if let Some(p) = cfg.outlook.as_ref().and_then(|f| feed("outlook", f)) {
        out.push(Box::new(OutlookProvider::new(p)));
    }
    for sub in &cfg.ical {
        if let Some(p) = Payload::from_feed(sub.label(), sub.path.as_ref(), sub.url.as_deref(), None) {
            out.push(Box::new(
                IcalProvider::new(sub.label(), sub.source(), p).with_default_offset(offset),
            ));
        }
    }
    if let Some(m) = &cfg.manual {
        out.push(Box::new(
            ManualMeetingsProvider::new(Payload::File(m.path.clone())).with_default_offset(offset),
        ));
    }
    out
}

/// RFC 3339 query bounds for calendar APIs.
#[cfg(feature = "ingest-http")]
pub(crate) fn range_query(range: &TimeRange, start_key: &'static str, end_key: &'static str) -> Vec<(&'static str, String)> {
    vec![
        (start_key, range.start.to_rfc3339()),
        (end_key, range.end.to_rfc3339()),
    ]
}

/// Midnight of `date` in `offset`.
pub(crate) fn midnight(date: NaiveDate, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    offset
        .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .single()
}

/// RFC 3339 first; a timestamp without offset is read in `fallback`.
pub(crate) fn parse_timestamp(s: &str, fallback: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .ok()?;
    fallback.from_local_datetime(&naive).single()
}

pub(crate) fn utc() -> FixedOffset {
    Utc.fix()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timestamp_accepts_offset_and_naive_forms() {
        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        let a = parse_timestamp("2026-02-14T10:00:00-05:00", utc()).unwrap();
        let b = parse_timestamp("2026-02-14T10:00:00", est).unwrap();
        let c = parse_timestamp("2026-02-14 10:00", est).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn from_config_respects_enabled_and_order() {
        let cfg: SourcesConfig = toml::from_str(
            r#"
            google = { path = "g.json" }
            outlook = { path = "o.json", enabled = false }
            manual = { path = "m.json" }

            [[ical]]
            name = "UniTime"
            path = "u.ics"
            "#,
        )
        .unwrap();
        let names: Vec<String> = from_config(&cfg).iter().map(|a| a.name().to_string()).collect();
        assert_eq!(names, vec!["google", "UniTime", "manual"]);
    }

    #[test]
    fn parse_timestamp_handles_seven_digit_fractions() {
        let t = parse_timestamp("2026-02-14T15:00:00.0000000", utc()).unwrap();
        assert_eq!(t.to_rfc3339(), "2026-02-14T15:00:00+00:00");
    }
}
