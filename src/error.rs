//! Error taxonomy.
//!
//! - `FetchError`: one adapter failed. Recovered by the orchestrator.
//! - `MalformedEvent`: one record broke its structural invariant. The record
//!   is dropped, the run continues.
//! - `ConfigurationError`: the deployment is broken. Raised before any run.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("could not parse feed: {0}")]
    Parse(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("source `{source_name}` timed out after {after:?}")]
    Timeout {
        source_name: String,
        after: Duration,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Parse(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed event `{id}`: {reason}")]
pub struct MalformedEvent {
    pub id: String,
    pub reason: String,
}

impl MalformedEvent {
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("scoring weights must sum to 1.0 (got {sum:.6})")]
    WeightSum { sum: f64 },
    #[error("scoring weight `{name}` must lie in [0,1] (got {value})")]
    WeightRange { name: &'static str, value: f64 },
    #[error("priority thresholds must satisfy 0 <= medium < high <= 1 (medium {medium}, high {high})")]
    Thresholds { medium: f64, high: f64 },
    #[error("category table is empty")]
    EmptyCategoryTable,
    #[error("category `{0}` appears more than once in the table")]
    DuplicateCategory(String),
    #[error("base weight of category `{name}` must lie in [0,1] (got {weight})")]
    CategoryWeight { name: String, weight: f64 },
    #[error("fallback category `{0}` is not defined in the category table")]
    MissingFallbackCategory(String),
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("computed score {score} left [0,1]; scoring configuration is inconsistent")]
    ScoreOutOfRange { score: f64 },
    #[error("reading configuration from {path}: {reason}")]
    Load { path: String, reason: String },
}
