// tests/providers_fixtures.rs
use chrono::{TimeZone, Utc};
use meeting_digest::config::{FeedSource, IcalSubscription, ManualSource, SourcesConfig};
use meeting_digest::ingest::providers::{self, GoogleCalendarProvider, IcalProvider, Payload};
use meeting_digest::{FetchError, Source, SourceAdapter, TimeRange};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn range(from_h: u32, to_h: u32) -> TimeRange {
    TimeRange::new(
        Utc.with_ymd_and_hms(2026, 2, 16, from_h, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 2, 16, to_h, 0, 0).unwrap(),
    )
}

#[tokio::test]
async fn adapters_return_only_events_in_range() {
    let google = GoogleCalendarProvider::new(Payload::File(fixture("google_events.json")));
    // 13:00-15:00 UTC covers the 09:00 EST 1:1 only.
    let evs = google.fetch(&range(13, 15)).await.unwrap();
    let ids: Vec<&str> = evs.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["g-sam-1"]);

    let ical = IcalProvider::new("UniTime", Source::University, Payload::File(fixture("unitime.ics")));
    let evs = ical.fetch(&range(17, 23)).await.unwrap();
    assert_eq!(evs.len(), 1);
    assert_eq!(evs[0].id, "cs240-oh@unitime");
    assert_eq!(evs[0].duration_minutes(), 60);
}

#[tokio::test]
async fn valarm_text_does_not_leak_into_event() {
    let ical = IcalProvider::new("UniTime", Source::University, Payload::File(fixture("unitime.ics")));
    let evs = ical.fetch(&range(0, 23)).await.unwrap();
    let lecture = evs.iter().find(|e| e.id == "cs240-lec@unitime").unwrap();
    assert_eq!(lecture.description, "Room LWSN B151");
    assert_eq!(lecture.start.to_rfc3339(), "2026-02-16T10:30:00-05:00");
}

#[tokio::test]
async fn missing_file_is_an_io_fetch_error() {
    let google = GoogleCalendarProvider::new(Payload::File(fixture("does_not_exist.json")));
    let err = google.fetch(&range(0, 23)).await.unwrap_err();
    assert!(matches!(err, FetchError::Io(_)));
}

#[tokio::test]
async fn adapters_built_from_config_read_their_files() {
    let cfg = SourcesConfig {
        google: Some(FeedSource {
            enabled: true,
            path: Some(fixture("google_events.json")),
            url: None,
            token_env: None,
        }),
        outlook: Some(FeedSource {
            enabled: true,
            path: Some(fixture("outlook_events.json")),
            url: None,
            token_env: None,
        }),
        ical: vec![IcalSubscription {
            name: "UniTime".into(),
            url: None,
            path: Some(fixture("unitime.ics")),
        }],
        manual: Some(ManualSource {
            path: fixture("manual_meetings.json"),
        }),
        default_utc_offset_minutes: -300,
    };

    let adapters = providers::from_config(&cfg);
    let names: Vec<&str> = adapters.iter().map(|a| a.name()).collect();
    assert_eq!(names, vec!["google", "outlook", "UniTime", "manual"]);

    let mut total = 0;
    for a in &adapters {
        total += a.fetch(&range(0, 23)).await.unwrap().len();
    }
    // google 3 + outlook 2 + ical 2 + manual 1 (the second manual record is skipped)
    assert_eq!(total, 8);
}
