//! medscout-common — Shared types and errors used across all Medscout crates.

pub mod error;
pub mod records;

// Re-export commonly used types
pub use error::{FetchError, PipelineError, SynthesisError};
pub use records::{
    normalise_candidate, AggregatedRow, MetricRecord, RankedResult, ScoredRow, Snippet,
    SourceReport,
};
