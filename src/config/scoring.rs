//! Scoring weights, level thresholds and factor caps.
//!
//! JSON/TOML shape:
//! ```toml
//! [scoring.weights]
//! category = 0.30
//! attendees = 0.20
//! duration = 0.15
//! external = 0.15
//! non_recurring = 0.10
//! agenda = 0.10
//!
//! [scoring.thresholds]
//! high = 0.60
//! medium = 0.35
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Tolerance for the weight-sum check.
pub const WEIGHT_SUM_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorWeights {
    pub category: f64,
    pub attendees: f64,
    pub duration: f64,
    pub external: f64,
    pub non_recurring: f64,
    pub agenda: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            category: 0.30,
            attendees: 0.20,
            duration: 0.15,
            external: 0.15,
            non_recurring: 0.10,
            agenda: 0.10,
        }
    }
}

impl FactorWeights {
    pub fn sum(&self) -> f64 {
        self.category
            + self.attendees
            + self.duration
            + self.external
            + self.non_recurring
            + self.agenda
    }

    fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("category", self.category),
            ("attendees", self.attendees),
            ("duration", self.duration),
            ("external", self.external),
            ("non_recurring", self.non_recurring),
            ("agenda", self.agenda),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelThresholds {
    /// `score >= high` is High.
    pub high: f64,
    /// `score >= medium` (and below `high`) is Medium; anything lower is Low.
    pub medium: f64,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            high: 0.60,
            medium: 0.35,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: FactorWeights,
    pub thresholds: LevelThresholds,
    /// Attendee count at which the attendee factor saturates.
    pub attendee_cap: u32,
    /// Duration in minutes at which the duration factor saturates.
    pub duration_cap_minutes: u32,
    /// A description longer than this many characters counts as an agenda.
    pub agenda_min_chars: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: FactorWeights::default(),
            thresholds: LevelThresholds::default(),
            attendee_cap: 10,
            duration_cap_minutes: 60,
            agenda_min_chars: 20,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (name, value) in self.weights.named() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::WeightRange { name, value });
            }
        }
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(ConfigurationError::WeightSum { sum });
        }

        let LevelThresholds { high, medium } = self.thresholds;
        let in_unit = (0.0..=1.0).contains(&high) && (0.0..=1.0).contains(&medium);
        if !in_unit || medium >= high {
            return Err(ConfigurationError::Thresholds { medium, high });
        }

        if self.attendee_cap == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "scoring.attendee_cap",
                reason: "must be at least 1".into(),
            });
        }
        if self.duration_cap_minutes == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "scoring.duration_cap_minutes",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
