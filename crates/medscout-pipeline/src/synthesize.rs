//! Report synthesis: ranked rows → markdown summary.
//!
//! Primary path prompts the injected LLM backend under a bounded
//! timeout. Any failure (timeout, auth, non-success API status) falls
//! back to a deterministic template, so the pipeline always returns a
//! summary. Ranking is complete before this stage runs; nothing here
//! can affect it.

use std::sync::Arc;
use std::time::Duration;

use medscout_common::records::metrics;
use medscout_common::{ScoredRow, SynthesisError};
use medscout_llm::{LlmBackend, LlmRequest, Message};
use tracing::{debug, warn};

/// Produce the summary markdown. Returns the text plus an optional
/// warning describing why the fallback was used.
pub async fn synthesize(
    question: &str,
    ranked: &[ScoredRow],
    llm: Option<&Arc<dyn LlmBackend>>,
    llm_timeout: Duration,
    top_n: usize,
) -> (String, Option<String>) {
    let Some(backend) = llm else {
        debug!("no LLM backend configured, using deterministic summary");
        return (fallback_summary(question, ranked, top_n), None);
    };

    match llm_summary(question, ranked, backend.as_ref(), llm_timeout, top_n).await {
        Ok(summary) => (summary, None),
        Err(e) => {
            let msg = format!("LLM synthesis failed, using deterministic fallback: {e}");
            warn!("{msg}");
            (fallback_summary(question, ranked, top_n), Some(msg))
        }
    }
}

async fn llm_summary(
    question: &str,
    ranked: &[ScoredRow],
    backend: &dyn LlmBackend,
    llm_timeout: Duration,
    top_n: usize,
) -> Result<String, SynthesisError> {
    let req = LlmRequest::new(vec![
        Message::system(
            "You are an expert pharma strategy analyst. Produce a structured, \
             concise markdown answer with sections: Executive Summary, Ranking \
             Rationale, Key Metrics Table, Signals & Gaps, Next Recommended \
             Actions, Citations. Keep it under 500 words. Be precise.",
        ),
        Message::user(build_prompt(question, ranked, top_n)),
    ]);

    let resp = tokio::time::timeout(llm_timeout, backend.complete(req))
        .await
        .map_err(|_| SynthesisError::Timeout(llm_timeout.as_secs()))?
        .map_err(|e| SynthesisError::Backend(e.to_string()))?;

    if resp.content.trim().is_empty() {
        return Err(SynthesisError::Backend("empty completion".to_string()));
    }
    debug!(model = %resp.model, "LLM summary produced");
    Ok(resp.content)
}

/// Prompt context: a CSV block of the ranked rows plus citation lines.
fn build_prompt(question: &str, ranked: &[ScoredRow], top_n: usize) -> String {
    let mut csv = vec![
        "disease,score,market_size_usd,competitor_count,phase2_trials,phase3_trials,trials_total"
            .to_string(),
    ];
    for r in ranked {
        csv.push(format!(
            "{},{:.3},{:.0},{:.0},{:.0},{:.0},{:.0}",
            r.candidate,
            r.score,
            r.metric(metrics::MARKET_SIZE_USD),
            r.metric(metrics::COMPETITOR_COUNT),
            r.metric(metrics::PHASE2_TRIALS),
            r.metric(metrics::PHASE3_TRIALS),
            r.metric(metrics::TRIALS_TOTAL),
        ));
    }

    let citations: Vec<String> = ranked
        .iter()
        .take(top_n)
        .flat_map(|r| r.snippets.iter())
        .take(8)
        .map(|s| format!("{} ({}): {}", s.candidate, s.source, s.text))
        .collect();

    let mut prompt = format!("Question: {question}\n\nRanked metrics CSV:\n{}\n", csv.join("\n"));
    if !citations.is_empty() {
        prompt.push_str("\nReference snippets:\n");
        prompt.push_str(&citations.join("\n"));
        prompt.push('\n');
    }
    prompt
}

/// Deterministic markdown summary used whenever the LLM is unavailable.
/// Lists the top candidates with their scores and raw metrics; no
/// generative prose.
pub fn fallback_summary(question: &str, ranked: &[ScoredRow], top_n: usize) -> String {
    let mut lines = vec![
        "## Executive Summary (Deterministic)".to_string(),
        format!("Question: {question}"),
    ];

    if ranked.is_empty() {
        lines.push(String::new());
        lines.push("No candidate diseases found.".to_string());
        return lines.join("\n");
    }

    lines.push(String::new());
    lines.push("### Top Candidates".to_string());
    for row in ranked.iter().take(top_n) {
        lines.push(format!(
            "- {} (score={:.2}, market_size_usd={:.0}, competitors={:.0}, trialsP2={:.0}, trialsP3={:.0})",
            row.candidate,
            row.score,
            row.metric(metrics::MARKET_SIZE_USD),
            row.metric(metrics::COMPETITOR_COUNT),
            row.metric(metrics::PHASE2_TRIALS),
            row.metric(metrics::PHASE3_TRIALS),
        ));
    }

    lines.push(String::new());
    lines.push("### Rationale".to_string());
    lines.push(
        "Score rewards burden (market size) and penalises competition (competitors \
         plus late-phase trials). Higher score means a more attractive opportunity."
            .to_string(),
    );

    let internal: Vec<&medscout_common::Snippet> = ranked
        .iter()
        .take(top_n)
        .flat_map(|r| r.snippets.iter())
        .filter(|s| s.source != "web")
        .take(3)
        .collect();
    if !internal.is_empty() {
        lines.push(String::new());
        lines.push("### Internal Notes".to_string());
        for s in internal {
            lines.push(format!("- {}: {}…", s.candidate, s.text));
        }
    }

    lines.push(String::new());
    lines.push("### Next Questions".to_string());
    lines.push("- Validate prevalence and unmet need".to_string());
    lines.push("- Review regulatory and pricing timelines".to_string());

    lines.join("\n")
}
