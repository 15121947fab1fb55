// src/ingest/types.rs
use crate::error::FetchError;
use crate::model::{SourceEvent, TimeRange};

/// Capability every calendar source exposes to the orchestrator. How an
/// adapter authenticates or what transport it uses stays behind this trait.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Events overlapping `range`.
    async fn fetch(&self, range: &TimeRange) -> Result<Vec<SourceEvent>, FetchError>;

    /// Label used in logs and run reports.
    fn name(&self) -> &str;
}

/// How one source fared during a fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    Ok { events: usize },
    Failed { error: String },
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    pub status: SourceStatus,
    pub elapsed_ms: u64,
}

impl SourceReport {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, SourceStatus::Ok { .. })
    }
}
