//! medscout-sources — Data-source adapters behind one fetch contract.
//!
//! Every source (live HTTP or canned) implements `SourceAdapter` and returns
//! a bag of named numeric metrics plus optional citation snippets for one
//! candidate disease. Adapters are registered in an explicit ordered list
//! passed into the fan-out dispatcher; there is no runtime introspection.
//!
//! Failure discipline: adapters report `FetchError::Transient` for
//! network-class failures (the dispatcher retries those) and
//! `FetchError::Terminal` when the request is fundamentally unsatisfiable
//! (unsupported candidate), which is never retried.

pub mod clinicaltrials;
pub mod knowledge;
pub mod market;
pub mod patents;
pub mod trade;
pub mod websearch;

use async_trait::async_trait;
use medscout_common::{FetchError, SourceReport};

/// Uniform fetch contract for one data source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Unique adapter name, used in cache keys and warning messages.
    fn name(&self) -> &'static str;

    /// Fetch metrics and snippets for one candidate disease.
    async fn fetch(&self, candidate: &str, question: &str) -> Result<SourceReport, FetchError>;
}
