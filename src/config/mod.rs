// src/config/mod.rs
//! Pipeline configuration: category table, scoring, filter rules, dedup
//! tolerance and fetch limits, plus the adapter settings the binary uses.
//!
//! Every section is `#[serde(default)]`, so a file only needs to name what it
//! overrides. Loading order for `load_default()`:
//! 1) `$MEETING_DIGEST_CONFIG`
//! 2) `config/pipeline.toml`
//! 3) `config/pipeline.json`
//! 4) built-in defaults

pub mod categories;
pub mod scoring;
pub mod sources;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigurationError;

pub use categories::{CategoryEntry, CategoryTable};
pub use scoring::{FactorWeights, LevelThresholds, ScoringConfig};
pub use sources::{FeedSource, IcalSubscription, ManualSource, SourcesConfig};

pub const ENV_CONFIG_PATH: &str = "MEETING_DIGEST_CONFIG";
pub const DEFAULT_TOML_PATH: &str = "config/pipeline.toml";
pub const DEFAULT_JSON_PATH: &str = "config/pipeline.json";

/// Upper bound for `dedup.tolerance_minutes`: one day.
pub const MAX_DEDUP_TOLERANCE_MINUTES: i64 = 24 * 60;

/// Filter rules; every rule can be switched off on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub exclude_cancelled: bool,
    pub exclude_all_day: bool,
    pub exclude_short: bool,
    pub min_duration_minutes: i64,
    pub exclude_noise: bool,
    /// Case-insensitive substrings matched against the title.
    pub noise_keywords: Vec<String>,
    /// Events with fewer attendees are dropped. `0` disables the rule.
    pub min_attendees: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            exclude_cancelled: true,
            exclude_all_day: true,
            exclude_short: true,
            min_duration_minutes: 5,
            exclude_noise: true,
            noise_keywords: [
                "out of office",
                "out-of-office",
                "ooo",
                "focus time",
                "lunch",
                "block",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            min_attendees: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Max start-time difference for two same-titled events to merge.
    pub tolerance_minutes: i64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            tolerance_minutes: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Hard per-source timeout; a source that exceeds it contributes nothing.
    pub timeout_secs: u64,
    /// How far ahead of "now" the binary asks adapters to look.
    pub lookahead_hours: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            lookahead_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub filter: FilterConfig,
    pub categories: CategoryTable,
    pub scoring: ScoringConfig,
    pub dedup: DedupConfig,
    pub fetch: FetchConfig,
    pub sources: SourcesConfig,
}

impl PipelineConfig {
    /// Checks every section; the first inconsistency wins.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.categories.validate()?;
        self.scoring.validate()?;
        if self.filter.min_duration_minutes < 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "filter.min_duration_minutes",
                reason: "must not be negative".into(),
            });
        }
        if !(0..=MAX_DEDUP_TOLERANCE_MINUTES).contains(&self.dedup.tolerance_minutes) {
            return Err(ConfigurationError::InvalidValue {
                field: "dedup.tolerance_minutes",
                reason: format!("must lie in 0..={MAX_DEDUP_TOLERANCE_MINUTES}"),
            });
        }
        if self.sources.default_offset().is_none() {
            return Err(ConfigurationError::InvalidValue {
                field: "sources.default_utc_offset_minutes",
                reason: "must be strictly between -1440 and 1440".into(),
            });
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "fetch.timeout_secs",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Load from an explicit path. `.json` is parsed as JSON, anything else as TOML.
    pub fn load_from(path: &Path) -> Result<Self, ConfigurationError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigurationError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse(&content, ext.as_str()).map_err(|reason| ConfigurationError::Load {
            path: path.display().to_string(),
            reason,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load using env var + fallbacks (see module docs).
    pub fn load_default() -> Result<Self, ConfigurationError> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(&p);
            if !pb.exists() {
                return Err(ConfigurationError::Load {
                    path: p,
                    reason: format!("{ENV_CONFIG_PATH} points to non-existent path"),
                });
            }
            return Self::load_from(&pb);
        }
        for candidate in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from(&pb);
            }
        }
        let cfg = Self::default();
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse(s: &str, hint_ext: &str) -> Result<PipelineConfig, String> {
    if hint_ext == "json" {
        serde_json::from_str(s).map_err(|e| e.to_string())
    } else {
        toml::from_str(s).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let toml = r#"
[dedup]
tolerance_minutes = 10

[filter]
noise_keywords = ["gym"]
"#;
        let cfg = parse(toml, "toml").unwrap();
        assert_eq!(cfg.dedup.tolerance_minutes, 10);
        assert_eq!(cfg.filter.noise_keywords, vec!["gym".to_string()]);
        assert!(cfg.filter.exclude_cancelled);
        assert_eq!(cfg.scoring, ScoringConfig::default());
        assert_eq!(cfg.categories, CategoryTable::default_seed());
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.dedup.tolerance_minutes = -1;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigurationError::InvalidValue {
                field: "dedup.tolerance_minutes",
                ..
            })
        ));
    }

    #[test]
    fn huge_tolerance_is_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.dedup.tolerance_minutes = i64::MAX / 2;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigurationError::InvalidValue {
                field: "dedup.tolerance_minutes",
                ..
            })
        ));

        cfg.dedup.tolerance_minutes = MAX_DEDUP_TOLERANCE_MINUTES;
        assert!(cfg.validate().is_ok());
    }
}
