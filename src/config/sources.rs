// src/config/sources.rs
//! Adapter settings. Read only by the binary when it wires up adapters; the
//! pipeline itself never sees them.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::model::Source;

fn enabled_by_default() -> bool {
    true
}

/// Google Calendar or Microsoft Graph feed: a local JSON file, or (with the
/// `ingest-http` feature) an API URL plus the env var holding a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSource {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub token_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcalSubscription {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl IcalSubscription {
    /// University timetable exports (UniTime and friends) get their own source
    /// label; any other feed is plain iCal.
    pub fn source(&self) -> Source {
        let hay = format!(
            "{} {}",
            self.name.to_ascii_lowercase(),
            self.url.as_deref().unwrap_or_default().to_ascii_lowercase()
        );
        if hay.contains("unitime") || hay.contains("university") || hay.contains("timetable") {
            Source::University
        } else {
            Source::Ical
        }
    }

    pub fn label(&self) -> &str {
        if !self.name.trim().is_empty() {
            self.name.trim()
        } else {
            self.url.as_deref().unwrap_or("ical")
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualSource {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub google: Option<FeedSource>,
    pub outlook: Option<FeedSource>,
    pub ical: Vec<IcalSubscription>,
    pub manual: Option<ManualSource>,
    /// Offset for times that carry none: floating iCal times, unknown TZIDs,
    /// naive manual timestamps, Google all-day dates.
    pub default_utc_offset_minutes: i32,
}

impl SourcesConfig {
    /// `None` when the configured offset is a day or more.
    pub fn default_offset(&self) -> Option<FixedOffset> {
        self.default_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unitime_feeds_are_university_sourced() {
        let s = IcalSubscription {
            name: "UniTime".into(),
            url: Some("https://timetable.example.edu/export.ics".into()),
            path: None,
        };
        assert_eq!(s.source(), Source::University);

        let plain = IcalSubscription {
            name: "Book club".into(),
            url: Some("https://cal.example.com/club.ics".into()),
            path: None,
        };
        assert_eq!(plain.source(), Source::Ical);
    }
}
