//! Runtime tuning knobs for the query pipeline.
//!
//! Read once at startup by the binary (toml + env) and passed in; the
//! pipeline itself never touches the environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Concurrent (candidate, source) fetches in flight at once.
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,
    /// Entries held by the process-wide fetch cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Retries after the first attempt, transient failures only.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff before retry i is base_delay_ms * 2^i, capped below.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Per-call timeout for source HTTP requests.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    /// Overall bound on one LLM synthesis call.
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,
    /// Candidate list cap after extraction.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    /// Rows shown in the synthesized summary.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_worker_pool_size() -> usize { 5 }
fn default_cache_capacity() -> usize { 100 }
fn default_max_retries() -> u32 { 3 }
fn default_base_delay_ms() -> u64 { 200 }
fn default_max_delay_ms() -> u64 { 5_000 }
fn default_call_timeout_secs() -> u64 { 20 }
fn default_llm_timeout_secs() -> u64 { 30 }
fn default_max_candidates() -> usize { 5 }
fn default_top_n() -> usize { 3 }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: default_worker_pool_size(),
            cache_capacity: default_cache_capacity(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            call_timeout_secs: default_call_timeout_secs(),
            llm_timeout_secs: default_llm_timeout_secs(),
            max_candidates: default_max_candidates(),
            top_n: default_top_n(),
        }
    }
}

impl PipelineConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}
