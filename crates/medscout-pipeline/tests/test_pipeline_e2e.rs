//! End-to-end pipeline tests with table-driven mock sources.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use medscout_common::records::metrics;
use medscout_common::{FetchError, PipelineError, SourceReport};
use medscout_pipeline::{run_query, PipelineConfig, PipelineContext};
use medscout_ranker::WeightTable;
use medscout_sources::SourceAdapter;

/// Serves one metric from a fixed per-candidate table.
struct TableAdapter {
    name: &'static str,
    metric: &'static str,
    values: BTreeMap<&'static str, f64>,
}

impl TableAdapter {
    fn new(name: &'static str, metric: &'static str, rows: &[(&'static str, f64)]) -> Self {
        Self { name, metric, values: rows.iter().copied().collect() }
    }
}

#[async_trait]
impl SourceAdapter for TableAdapter {
    fn name(&self) -> &'static str {
        self.name
    }
    async fn fetch(&self, candidate: &str, _q: &str) -> Result<SourceReport, FetchError> {
        let value = self
            .values
            .get(candidate)
            .copied()
            .ok_or_else(|| FetchError::terminal(format!("no data for {candidate}")))?;
        let mut report = SourceReport::default();
        report.metrics.insert(self.metric.to_string(), value);
        Ok(report)
    }
}

struct AlwaysTransientAdapter {
    calls: AtomicU32,
}

#[async_trait]
impl SourceAdapter for AlwaysTransientAdapter {
    fn name(&self) -> &'static str {
        "patents"
    }
    async fn fetch(&self, _c: &str, _q: &str) -> Result<SourceReport, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(FetchError::transient("upstream unreachable"))
    }
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
        let mut report = SourceReport::default();
        report.metrics.insert(metrics::TRIALS_TOTAL.to_string(), 4.0);
        Ok(report)
    }
}

fn fast_config() -> PipelineConfig {
    PipelineConfig {
        max_retries: 2,
        base_delay_ms: 1,
        max_delay_ms: 2,
        ..PipelineConfig::default()
    }
}

fn burden_vs_competition() -> WeightTable {
    let mut w = BTreeMap::new();
    w.insert(metrics::MARKET_SIZE_USD.to_string(), 0.5);
    w.insert(metrics::COMPETITOR_COUNT.to_string(), -0.5);
    WeightTable::new(w)
}

fn respiratory_adapters() -> Vec<Arc<dyn SourceAdapter>> {
    vec![
        Arc::new(TableAdapter::new(
            "market",
            metrics::MARKET_SIZE_USD,
            &[("Asthma", 1e9), ("COPD", 2e9), ("Pulmonary Fibrosis", 0.5e9)],
        )),
        Arc::new(TableAdapter::new(
            "competition",
            metrics::COMPETITOR_COUNT,
            &[("Asthma", 50.0), ("COPD", 10.0), ("Pulmonary Fibrosis", 5.0)],
        )),
    ]
}

fn seeds() -> Vec<String> {
    vec![
        "Asthma".to_string(),
        "COPD".to_string(),
        "Pulmonary Fibrosis".to_string(),
    ]
}

#[tokio::test]
async fn test_golden_ranking_with_hand_computed_scores() {
    let ctx = PipelineContext::new(&fast_config(), burden_vs_competition(), respiratory_adapters())
        .with_seed_candidates(seeds());

    let result = run_query("respiratory diseases with low competition", &ctx)
        .await
        .unwrap();

    assert_eq!(result.ranked.len(), 3);
    assert!(result.warnings.is_empty());

    // market normalises to [1/3, 1, 0], competitors to [1, 1/9, 0]
    assert_eq!(result.ranked[0].candidate, "COPD");
    assert_eq!(result.ranked[1].candidate, "Pulmonary Fibrosis");
    assert_eq!(result.ranked[2].candidate, "Asthma");

    assert!((result.ranked[0].score - (0.5 + 0.5 * (8.0 / 9.0))).abs() < 1e-9);
    assert!((result.ranked[1].score - 0.5).abs() < 1e-9);
    assert!((result.ranked[2].score - (0.5 / 3.0)).abs() < 1e-9);

    // No LLM configured: summary is the deterministic template
    assert!(result.summary.contains("### Top Candidates"));
    assert!(result.summary.contains("COPD"));
}

#[tokio::test]
async fn test_partial_failure_zero_fills_and_warns() {
    let failing = Arc::new(AlwaysTransientAdapter { calls: AtomicU32::new(0) });
    let mut adapters = respiratory_adapters();
    adapters.push(failing.clone());

    let ctx = PipelineContext::new(&fast_config(), burden_vs_competition(), adapters)
        .with_seed_candidates(seeds());

    let result = run_query("respiratory landscape", &ctx).await.unwrap();

    // Full ranked list despite the failing source
    assert_eq!(result.ranked.len(), 3);
    for row in &result.ranked {
        assert_eq!(row.metric(metrics::PATENT_FILINGS_LAST_5Y), 0.0);
        assert!(row.metric(metrics::MARKET_SIZE_USD) > 0.0);
    }

    // One aggregated warning for the failing adapter, naming the retries
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("patents adapter failed"));
    assert!(result.warnings[0].contains("after 2 retries"));

    // 3 candidates × (1 attempt + 2 retries)
    assert_eq!(failing.calls.load(Ordering::SeqCst), 9);
}

#[tokio::test]
async fn test_zero_candidates_raises_pipeline_error() {
    let ctx = PipelineContext::new(&fast_config(), WeightTable::default(), respiratory_adapters());

    let err = run_query("what colour should the logo be?", &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NoCandidates(_)));
}

#[tokio::test]
async fn test_candidates_extracted_from_question_text() {
    let ctx = PipelineContext::new(&fast_config(), burden_vs_competition(), respiratory_adapters());

    let result = run_query(
        "compare asthma, COPD and pulmonary fibrosis for low competition",
        &ctx,
    )
    .await
    .unwrap();

    let names: Vec<&str> = result.ranked.iter().map(|r| r.candidate.as_str()).collect();
    assert_eq!(names.len(), 3);
    assert!(names.contains(&"COPD"));
    assert!(names.contains(&"Asthma"));
    assert!(names.contains(&"Pulmonary Fibrosis"));
}

#[tokio::test]
async fn test_cache_spares_repeat_queries() {
    let counting = Arc::new(CountingAdapter { calls: AtomicU32::new(0) });
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![counting.clone()];

    let ctx = PipelineContext::new(&fast_config(), WeightTable::default(), adapters)
        .with_seed_candidates(vec!["COPD".to_string(), "Asthma".to_string()]);

    run_query("trial crowding", &ctx).await.unwrap();
    run_query("trial crowding", &ctx).await.unwrap();

    // Second run served entirely from cache
    assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_result_metadata_is_populated() {
    let ctx = PipelineContext::new(&fast_config(), burden_vs_competition(), respiratory_adapters())
        .with_seed_candidates(seeds());

    let result = run_query("respiratory diseases", &ctx).await.unwrap();

    assert_eq!(result.question, "respiratory diseases");
    assert!(!result.summary.is_empty());
    for row in &result.ranked {
        assert!(row.score.is_finite());
        assert!((0.0..=1.0).contains(&row.score));
    }
}

#[tokio::test]
async fn test_terminal_candidate_warns_without_retry_storm() {
    let market = Arc::new(TableAdapter::new(
        "market",
        metrics::MARKET_SIZE_USD,
        &[("COPD", 2e9)], // nothing for the second candidate
    ));
    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![market];

    let ctx = PipelineContext::new(&fast_config(), burden_vs_competition(), adapters)
        .with_seed_candidates(vec!["COPD".to_string(), "Bronchiectasis".to_string()]);

    let result = run_query("niche respiratory", &ctx).await.unwrap();

    assert_eq!(result.ranked.len(), 2);
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("market adapter failed for Bronchiectasis"));
    assert!(!result.warnings[0].contains("retries"));
}
