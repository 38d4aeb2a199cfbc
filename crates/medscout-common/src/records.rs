//! Data model for one query execution.
//!
//! A query flows through these shapes in order:
//!   SourceReport (one per candidate × adapter call)
//!   AggregatedRow (merged reports per candidate)
//!   ScoredRow     (row + composite score + normalised components)
//!   RankedResult  (ordered rows + summary + run metadata)
//!
//! All of these are owned by a single query execution and never mutated
//! after scoring. The only cross-query state in the system is the fetch
//! cache, which lives elsewhere.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metric name → raw numeric value for one (candidate, source) call.
/// Metrics a source does not report are absent here and zero-filled
/// at scoring time, which keeps min-max normalisation well-defined.
pub type MetricRecord = BTreeMap<String, f64>;

/// Canonical metric names shared between sources, scoring, and config.
pub mod metrics {
    pub const MARKET_SIZE_USD: &str = "market_size_usd";
    pub const COMPETITOR_COUNT: &str = "competitor_count";
    pub const PHASE2_TRIALS: &str = "phase2_trials";
    pub const PHASE3_TRIALS: &str = "phase3_trials";
    pub const TRIALS_TOTAL: &str = "trials_total";
    pub const API_EXPORTS_TONNES: &str = "api_exports_tonnes";
    pub const API_IMPORTS_TONNES: &str = "api_imports_tonnes";
    pub const PATENT_FILINGS_LAST_5Y: &str = "patent_filings_last_5y";
    pub const KEY_PATENTS_EXPIRING_IN_YEARS: &str = "key_patents_expiring_in_years";
}

/// Disease acronyms that keep their upper-case form after normalisation.
const ACRONYMS: &[&str] = &["copd", "ild", "ipf", "tb", "nsclc", "cf"];

/// Case-normalise a disease name for use as a candidate key.
/// Collapses whitespace, upper-cases known acronyms (COPD, ILD, TB),
/// title-cases everything else.
pub fn normalise_candidate(raw: &str) -> String {
    let words: Vec<&str> = raw.split_whitespace().collect();
    let mut out = Vec::with_capacity(words.len());
    for w in words {
        let cleaned: String = w.chars().filter(|c| c.is_alphanumeric() || *c == '-').collect();
        if cleaned.is_empty() {
            continue;
        }
        if ACRONYMS.contains(&cleaned.to_lowercase().as_str()) {
            out.push(cleaned.to_uppercase());
        } else {
            let mut chars = cleaned.chars();
            let first = chars.next().map(|c| c.to_uppercase().to_string()).unwrap_or_default();
            out.push(format!("{}{}", first, chars.as_str().to_lowercase()));
        }
    }
    out.join(" ")
}

/// Free-text citation collected from web search or internal notes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snippet {
    pub candidate: String,
    pub text: String,
    pub source: String,
}

/// What one source adapter returns for one candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceReport {
    pub metrics: MetricRecord,
    pub snippets: Vec<Snippet>,
}

impl SourceReport {
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.snippets.is_empty()
    }
}

/// Union of all source reports for one candidate within one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedRow {
    pub candidate: String,
    pub metrics: MetricRecord,
    pub snippets: Vec<Snippet>,
}

impl AggregatedRow {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            metrics: MetricRecord::new(),
            snippets: Vec::new(),
        }
    }

    /// Merge one source report into this row. Later sources win on
    /// metric-name collisions (last write wins, same as the cache policy).
    pub fn absorb(&mut self, report: SourceReport) {
        self.metrics.extend(report.metrics);
        self.snippets.extend(report.snippets);
    }

    pub fn metric(&self, name: &str) -> f64 {
        self.metrics.get(name).copied().unwrap_or(0.0)
    }
}

/// An aggregated row plus the composite score that ranked it.
/// `components` keeps the per-metric min-max values for explainability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRow {
    pub candidate: String,
    pub score: f64,
    pub metrics: MetricRecord,
    pub components: BTreeMap<String, f64>,
    pub snippets: Vec<Snippet>,
}

impl ScoredRow {
    pub fn metric(&self, name: &str) -> f64 {
        self.metrics.get(name).copied().unwrap_or(0.0)
    }
}

/// Final output of one query run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResult {
    pub query_id: Uuid,
    pub question: String,
    pub ranked: Vec<ScoredRow>,
    /// Markdown summary: LLM-written when a backend is available,
    /// deterministic template otherwise.
    pub summary: String,
    pub processing_time_ms: u64,
    /// Partial failures recorded during the run, e.g.
    /// "patents adapter failed for COPD after 3 retries: ...".
    pub warnings: Vec<String>,
}
