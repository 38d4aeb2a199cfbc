//! Fan-out dispatcher: candidates × sources through a bounded pool.
//!
//! Each (candidate, source) pair is one independent task: cache lookup,
//! then a retried fetch. A task that fails after its retry budget is
//! downgraded to a warning and zero-filled metrics; sibling tasks are
//! never aborted and the dispatcher returns only once every task has
//! settled. No ordering is guaranteed between task completions, so the
//! settled results are re-sorted before folding to keep row contents
//! deterministic.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use medscout_common::{AggregatedRow, FetchError, SourceReport};
use medscout_sources::SourceAdapter;
use tracing::{debug, warn};

use crate::cache::FetchCache;
use crate::retry::{call_with_retry, RetryPolicy};

pub struct GatherOutcome {
    /// One row per candidate, in the caller's candidate order.
    pub rows: Vec<AggregatedRow>,
    pub warnings: Vec<String>,
}

pub async fn gather(
    question: &str,
    candidates: &[String],
    adapters: &[Arc<dyn SourceAdapter>],
    cache: &FetchCache<SourceReport>,
    retry: &RetryPolicy,
    pool_size: usize,
) -> GatherOutcome {
    let mut tasks = Vec::with_capacity(candidates.len() * adapters.len());
    for (ci, candidate) in candidates.iter().enumerate() {
        for adapter in adapters {
            let candidate = candidate.clone();
            let adapter = Arc::clone(adapter);
            tasks.push(async move {
                let key = format!("{}::{}::{question}", adapter.name(), candidate);
                let source = adapter.as_ref();
                let cand = candidate.as_str();
                let fetched = cache
                    .get_or_fetch(&key, || {
                        call_with_retry(retry, move || source.fetch(cand, question))
                    })
                    .await;
                (ci, adapter.name(), fetched)
            });
        }
    }

    debug!(
        n_tasks = tasks.len(),
        pool_size,
        "dispatching candidate × source fan-out"
    );

    let mut settled: Vec<(usize, &'static str, Result<SourceReport, FetchError>)> =
        stream::iter(tasks)
            .buffer_unordered(pool_size.max(1))
            .collect()
            .await;
    settled.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    let mut rows: Vec<AggregatedRow> = candidates
        .iter()
        .map(|c| AggregatedRow::new(c.clone()))
        .collect();

    // One warning per failing adapter, listing every candidate it failed on
    let mut failures: BTreeMap<&'static str, (Vec<String>, FetchError)> = BTreeMap::new();
    for (ci, source, result) in settled {
        match result {
            Ok(report) => rows[ci].absorb(report),
            Err(e) => {
                warn!(adapter = source, candidate = %candidates[ci], "source call failed: {e}");
                match failures.entry(source) {
                    Entry::Vacant(v) => {
                        v.insert((vec![candidates[ci].clone()], e));
                    }
                    Entry::Occupied(mut o) => o.get_mut().0.push(candidates[ci].clone()),
                }
            }
        }
    }

    let warnings = failures
        .into_iter()
        .map(|(source, (cands, err))| {
            let list = cands.join(", ");
            if err.is_transient() {
                format!(
                    "{source} adapter failed for {list} after {} retries: {err}",
                    retry.max_retries
                )
            } else {
                format!("{source} adapter failed for {list}: {err}")
            }
        })
        .collect();

    GatherOutcome { rows, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use medscout_common::records::metrics;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::time::Duration;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    struct StaticAdapter {
        name: &'static str,
        metric: &'static str,
        value: f64,
    }

    #[async_trait]
    impl SourceAdapter for StaticAdapter {
        fn name(&self) -> &'static str {
            self.name
        }
        async fn fetch(&self, _c: &str, _q: &str) -> Result<SourceReport, FetchError> {
            let mut report = SourceReport::default();
            report.metrics.insert(self.metric.to_string(), self.value);
            Ok(report)
        }
    }

    struct AlwaysTransient {
        calls: AtomicU32,
    }

    #[async_trait]
    impl SourceAdapter for AlwaysTransient {
        fn name(&self) -> &'static str {
            "flaky"
        }
        async fn fetch(&self, _c: &str, _q: &str) -> Result<SourceReport, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::transient("connection reset"))
        }
    }

    struct ConcurrencyProbe {
        live: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl SourceAdapter for ConcurrencyProbe {
        fn name(&self) -> &'static str {
            "probe"
        }
        async fn fetch(&self, _c: &str, _q: &str) -> Result<SourceReport, FetchError> {
            let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(live, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.live.fetch_sub(1, Ordering::SeqCst);
            Ok(SourceReport::default())
        }
    }

    #[tokio::test]
    async fn test_rows_follow_candidate_order() {
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(StaticAdapter {
            name: "market",
            metric: metrics::MARKET_SIZE_USD,
            value: 1e9,
        })];
        let candidates = vec!["COPD".to_string(), "Asthma".to_string()];
        let cache = FetchCache::new(16);

        let outcome = gather("q", &candidates, &adapters, &cache, &fast_retry(), 4).await;

        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[0].candidate, "COPD");
        assert_eq!(outcome.rows[1].candidate, "Asthma");
        assert_eq!(outcome.rows[0].metric(metrics::MARKET_SIZE_USD), 1e9);
        assert!(outcome.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_failing_adapter_becomes_warning_not_abort() {
        let flaky = Arc::new(AlwaysTransient { calls: AtomicU32::new(0) });
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
            Arc::new(StaticAdapter {
                name: "market",
                metric: metrics::MARKET_SIZE_USD,
                value: 2e9,
            }),
            flaky.clone(),
        ];
        let candidates = vec!["COPD".to_string()];
        let cache = FetchCache::new(16);

        let outcome = gather("q", &candidates, &adapters, &cache, &fast_retry(), 4).await;

        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].metric(metrics::MARKET_SIZE_USD), 2e9);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("flaky adapter failed for COPD after 2 retries"));
        // retries exhausted: 1 + max_retries attempts
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_pool_bound_is_respected() {
        let probe = Arc::new(ConcurrencyProbe {
            live: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![probe.clone()];
        let candidates: Vec<String> = (0..12).map(|i| format!("disease-{i}")).collect();
        let cache = FetchCache::new(64);

        gather("q", &candidates, &adapters, &cache, &fast_retry(), 3).await;

        assert!(
            probe.peak.load(Ordering::SeqCst) <= 3,
            "peak concurrency {} exceeded pool size",
            probe.peak.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn test_repeat_gather_hits_cache() {
        let flaky_free = Arc::new(AlwaysTransient { calls: AtomicU32::new(0) });
        let counting = Arc::new(CountingAdapter { calls: AtomicU32::new(0) });
        let adapters: Vec<Arc<dyn SourceAdapter>> = vec![counting.clone(), flaky_free.clone()];
        let candidates = vec!["ILD".to_string()];
        let cache = FetchCache::new(16);

        gather("q", &candidates, &adapters, &cache, &fast_retry(), 2).await;
        gather("q", &candidates, &adapters, &cache, &fast_retry(), 2).await;

        // Success was cached; the failure was not, so it re-ran its retries
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
        assert_eq!(flaky_free.calls.load(Ordering::SeqCst), 6);
    }

    struct CountingAdapter {
        calls: AtomicU32,
    }

    #[async_trait]
    impl SourceAdapter for CountingAdapter {
        fn name(&self) -> &'static str {
            "counting"
        }
        async fn fetch(&self, _c: &str, _q: &str) -> Result<SourceReport, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SourceReport::default())
        }
    }
}
