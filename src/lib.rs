// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod digest;
pub mod error;
pub mod ingest;
pub mod model;
pub mod pipeline;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::config::PipelineConfig;
pub use crate::digest::DigestSummary;
pub use crate::error::{ConfigurationError, FetchError, MalformedEvent};
pub use crate::ingest::{fetch_all, SourceAdapter};
pub use crate::model::{
    Category, PriorityLevel, ProcessedEvent, Source, SourceEvent, TimeRange,
};
pub use crate::pipeline::{Pipeline, RunReport};
