//! End-to-end query orchestration.
//!
//! `run_query` drives one question through extraction, fan-out, scoring,
//! and synthesis. Per-source failures surface as warnings on the result;
//! the only hard failure is an empty candidate list.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use medscout_common::{
    normalise_candidate, PipelineError, RankedResult, SourceReport,
};
use medscout_llm::LlmBackend;
use medscout_ranker::{score_rows, WeightTable};
use medscout_sources::websearch::TavilyClient;
use medscout_sources::SourceAdapter;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::cache::FetchCache;
use crate::candidates::extract_candidates;
use crate::config::PipelineConfig;
use crate::dispatch::gather;
use crate::retry::RetryPolicy;
use crate::synthesize::synthesize;

/// Lifecycle of one query. Synthesis failure still lands in `Done`;
/// there is no terminal failed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    Received,
    CandidatesExtracted,
    Fetching,
    Scored,
    Synthesizing,
    Done,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryStage::Received => "received",
            QueryStage::CandidatesExtracted => "candidates_extracted",
            QueryStage::Fetching => "fetching",
            QueryStage::Scored => "scored",
            QueryStage::Synthesizing => "synthesizing",
            QueryStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Everything one query execution needs, built once at startup and
/// passed by reference. The fetch cache is the only state shared
/// between concurrent queries.
pub struct PipelineContext {
    pub adapters: Vec<Arc<dyn SourceAdapter>>,
    pub llm: Option<Arc<dyn LlmBackend>>,
    pub web: Option<TavilyClient>,
    pub cache: FetchCache<SourceReport>,
    pub retry: RetryPolicy,
    pub weights: WeightTable,
    pub worker_pool_size: usize,
    pub llm_timeout: Duration,
    pub max_candidates: usize,
    pub top_n: usize,
    /// When non-empty, extraction is skipped and this list is ranked
    /// as-is (after case normalisation).
    pub seed_candidates: Vec<String>,
}

impl PipelineContext {
    pub fn new(
        config: &PipelineConfig,
        weights: WeightTable,
        adapters: Vec<Arc<dyn SourceAdapter>>,
    ) -> Self {
        Self {
            adapters,
            llm: None,
            web: None,
            cache: FetchCache::new(config.cache_capacity),
            retry: config.retry_policy(),
            weights,
            worker_pool_size: config.worker_pool_size,
            llm_timeout: config.llm_timeout(),
            max_candidates: config.max_candidates,
            top_n: config.top_n,
            seed_candidates: Vec::new(),
        }
    }

    pub fn with_llm(mut self, backend: Arc<dyn LlmBackend>) -> Self {
        self.llm = Some(backend);
        self
    }

    pub fn with_web_search(mut self, client: TavilyClient) -> Self {
        self.web = Some(client);
        self
    }

    pub fn with_seed_candidates(mut self, seeds: Vec<String>) -> Self {
        self.seed_candidates = seeds;
        self
    }
}

#[instrument(skip(ctx), fields(query_id = tracing::field::Empty))]
pub async fn run_query(
    question: &str,
    ctx: &PipelineContext,
) -> Result<RankedResult, PipelineError> {
    let t0 = Instant::now();
    let query_id = Uuid::new_v4();
    tracing::Span::current().record("query_id", tracing::field::display(query_id));

    let mut warnings: Vec<String> = Vec::new();
    info!(stage = %QueryStage::Received, "query received");

    // ── Candidates ────────────────────────────────────────────────────────
    let candidates: Vec<String> = if ctx.seed_candidates.is_empty() {
        let outcome = extract_candidates(
            question,
            ctx.web.as_ref(),
            ctx.llm.as_ref(),
            &ctx.retry,
            ctx.llm_timeout,
            ctx.max_candidates,
        )
        .await;
        warnings.extend(outcome.warnings);
        outcome.candidates
    } else {
        let mut seeds: Vec<String> = Vec::new();
        for s in &ctx.seed_candidates {
            let n = normalise_candidate(s);
            if !n.is_empty() && !seeds.contains(&n) {
                seeds.push(n);
            }
        }
        seeds
    };

    if candidates.is_empty() {
        return Err(PipelineError::NoCandidates(format!(
            "no known disease mentioned in question: {question}"
        )));
    }
    info!(
        stage = %QueryStage::CandidatesExtracted,
        n = candidates.len(),
        candidates = ?candidates,
        "candidates ready"
    );

    // ── Fetch ─────────────────────────────────────────────────────────────
    info!(stage = %QueryStage::Fetching, n_adapters = ctx.adapters.len(), "fanning out");
    let gathered = gather(
        question,
        &candidates,
        &ctx.adapters,
        &ctx.cache,
        &ctx.retry,
        ctx.worker_pool_size,
    )
    .await;
    warnings.extend(gathered.warnings);

    // ── Score ─────────────────────────────────────────────────────────────
    let ranked = score_rows(gathered.rows, &ctx.weights);
    info!(stage = %QueryStage::Scored, n = ranked.len(), "rows scored");

    // ── Synthesize ────────────────────────────────────────────────────────
    info!(stage = %QueryStage::Synthesizing, "building summary");
    let (summary, synth_warning) = synthesize(
        question,
        &ranked,
        ctx.llm.as_ref(),
        ctx.llm_timeout,
        ctx.top_n,
    )
    .await;
    warnings.extend(synth_warning);

    let result = RankedResult {
        query_id,
        question: question.to_string(),
        ranked,
        summary,
        processing_time_ms: t0.elapsed().as_millis() as u64,
        warnings,
    };
    info!(
        stage = %QueryStage::Done,
        elapsed_ms = result.processing_time_ms,
        n_warnings = result.warnings.len(),
        "query complete"
    );
    Ok(result)
}
