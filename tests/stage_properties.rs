// tests/stage_properties.rs
use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use meeting_digest::config::{
    CategoryEntry, CategoryTable, FactorWeights, FilterConfig, LevelThresholds, ScoringConfig,
};
use meeting_digest::pipeline::classify::classify;
use meeting_digest::pipeline::filter::filter;
use meeting_digest::pipeline::scoring::{score, Scorer};
use meeting_digest::{Category, ConfigurationError, Pipeline, PipelineConfig, Source, SourceEvent};
use rand::{Rng, SeedableRng};

fn at(h: u32, m: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2026, 3, 2, h, m, 0)
        .unwrap()
}

fn timed(id: &str, title: &str) -> SourceEvent {
    SourceEvent::new(id, Source::Google, title, at(10, 0), at(11, 0))
}

#[test]
fn default_filter_drops_cancelled_all_day_and_focus_time() {
    let events = vec![
        timed("keep", "Roadmap review"),
        timed("cancelled", "Roadmap review").cancelled(),
        SourceEvent::new("allday", Source::Google, "Offsite", at(0, 0), at(0, 0) + Duration::days(1)).all_day(),
        timed("focus", "Focus Time"),
        SourceEvent::new("short", Source::Google, "Quick ping", at(10, 0), at(10, 4)),
    ];
    let kept = filter(events, &FilterConfig::default()).unwrap();
    let ids: Vec<&str> = kept.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["keep"]);
}

#[test]
fn filter_reports_malformed_record() {
    let bad = SourceEvent::new("bad", Source::Outlook, "Sync", at(11, 0), at(10, 0));
    let err = filter(vec![timed("ok", "Sync"), bad], &FilterConfig::default()).unwrap_err();
    assert_eq!(err.id, "bad");
}

#[test]
fn classifier_tie_break_follows_table_order() {
    let ev = timed("c", "Client Networking Coffee Chat");
    let seed = CategoryTable::default_seed();
    assert_eq!(classify(&ev, &seed).as_str(), "Client");
    // Reproducible.
    assert_eq!(classify(&ev, &seed), classify(&ev, &seed));

    let flipped = CategoryTable::new(vec![
        CategoryEntry::new("Networking", 0.7, &["networking", "coffee chat"]),
        CategoryEntry::new("Client", 0.9, &["client"]),
        CategoryEntry::new("Team", 0.5, &["team"]),
        CategoryEntry::new("Other", 0.4, &[]),
    ]);
    assert_eq!(classify(&ev, &flipped).as_str(), "Networking");
}

#[test]
fn weights_must_sum_to_one() {
    let cfg = ScoringConfig {
        weights: FactorWeights {
            agenda: 0.2,
            ..FactorWeights::default()
        },
        ..ScoringConfig::default()
    };
    assert!(matches!(
        Scorer::new(cfg.clone(), CategoryTable::default_seed()),
        Err(ConfigurationError::WeightSum { .. })
    ));

    let ev = timed("x", "Sync");
    assert!(matches!(
        score(&ev, &Category::new("Other"), &cfg, &CategoryTable::default_seed()),
        Err(ConfigurationError::WeightSum { .. })
    ));

    let mut pcfg = PipelineConfig::default();
    pcfg.scoring = cfg;
    assert!(Pipeline::new(pcfg).is_err());
}

#[test]
fn non_monotonic_thresholds_are_rejected() {
    let cfg = ScoringConfig {
        thresholds: LevelThresholds {
            high: 0.3,
            medium: 0.5,
        },
        ..ScoringConfig::default()
    };
    assert!(matches!(
        cfg.validate(),
        Err(ConfigurationError::Thresholds { .. })
    ));
}

#[test]
fn empty_category_table_is_rejected() {
    let mut cfg = PipelineConfig::default();
    cfg.categories = CategoryTable::new(vec![]);
    assert!(matches!(
        Pipeline::new(cfg),
        Err(ConfigurationError::EmptyCategoryTable)
    ));
}

#[test]
fn scores_stay_in_unit_interval() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let table = CategoryTable::default_seed();
    let scorer = Scorer::new(ScoringConfig::default(), table.clone()).unwrap();
    let domains = ["acme.com", "client.io", "uni.edu"];

    for i in 0..500 {
        let n_att = rng.random_range(0..25);
        let attendees: Vec<String> = (0..n_att)
            .map(|k| format!("p{k}@{}", domains[rng.random_range(0..domains.len())]))
            .collect();
        let minutes = rng.random_range(0..600);
        let desc_len = rng.random_range(0..60);
        let mut ev = SourceEvent::new(
            format!("r{i}"),
            Source::Google,
            "Random",
            at(8, 0),
            at(8, 0) + Duration::minutes(minutes),
        )
        .with_attendees(attendees)
        .with_description("x".repeat(desc_len));
        if rng.random_bool(0.5) {
            ev = ev.with_organizer(format!("me@{}", domains[rng.random_range(0..domains.len())]));
        }
        if rng.random_bool(0.5) {
            ev = ev.recurring();
        }
        let entry = &table.entries[rng.random_range(0..table.entries.len())];
        let p = scorer.score(&ev, &Category::new(entry.name.clone())).unwrap();
        assert!((0.0..=1.0).contains(&p.score), "score {} out of range", p.score);
    }
}

#[test]
fn unknown_category_scores_like_default() {
    let scorer = Scorer::new(ScoringConfig::default(), CategoryTable::default_seed()).unwrap();
    let ev = timed("u", "Anything");
    let unknown = scorer.score(&ev, &Category::new("Not-A-Category")).unwrap();
    let other = scorer.score(&ev, &Category::new("Other")).unwrap();
    assert_eq!(unknown, other);
}
