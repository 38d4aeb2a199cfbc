//! Candidate extraction: free-text question → short list of diseases.
//!
//! Three layers, each optional except the last:
//!   1. web search payload pulled for extra context (retried like any
//!      other source call)
//!   2. LLM extraction into a JSON array, under a bounded timeout
//!   3. lexicon scan over question + context, the deterministic fallback
//!
//! Failures in layers 1 and 2 are recorded as warnings and the next
//! layer runs; only an empty final list is fatal to the query, and that
//! decision belongs to the caller.

use std::sync::Arc;
use std::time::Duration;

use medscout_common::normalise_candidate;
use medscout_llm::{LlmBackend, LlmRequest, Message};
use medscout_sources::websearch::TavilyClient;
use tracing::{debug, warn};

use crate::retry::{call_with_retry, RetryPolicy};

/// Canonical disease names and the keywords that imply them.
/// Single-token keywords are matched on word boundaries so "tb" does not
/// fire inside unrelated words.
const DISEASE_LEXICON: &[(&str, &[&str])] = &[
    ("COPD", &["copd", "chronic obstructive pulmonary"]),
    ("Asthma", &["asthma"]),
    ("ILD", &["ild", "interstitial lung disease"]),
    ("Pulmonary Fibrosis", &["pulmonary fibrosis", "ipf", "idiopathic pulmonary"]),
    ("Bronchiectasis", &["bronchiectasis"]),
    ("Tuberculosis", &["tuberculosis", "tb"]),
    ("Pneumonia", &["pneumonia"]),
];

pub struct ExtractionOutcome {
    pub candidates: Vec<String>,
    pub warnings: Vec<String>,
}

pub async fn extract_candidates(
    question: &str,
    web: Option<&TavilyClient>,
    llm: Option<&Arc<dyn LlmBackend>>,
    retry: &RetryPolicy,
    llm_timeout: Duration,
    max_candidates: usize,
) -> ExtractionOutcome {
    let mut warnings = Vec::new();

    // 1. Optional web context
    let mut context = question.to_string();
    if let Some(client) = web {
        match call_with_retry(retry, move || client.search(question)).await {
            Ok(payload) => {
                if !payload.is_empty() {
                    context.push(' ');
                    context.push_str(&payload.text());
                }
            }
            Err(e) => {
                let msg = format!("web search failed during candidate extraction: {e}");
                warn!("{msg}");
                warnings.push(msg);
            }
        }
    }

    // 2. Optional LLM extraction
    if let Some(backend) = llm {
        match llm_extract(question, &context, backend.as_ref(), llm_timeout, max_candidates).await
        {
            Ok(names) if !names.is_empty() => {
                return ExtractionOutcome {
                    candidates: dedup_cap(names, max_candidates),
                    warnings,
                };
            }
            Ok(_) => {
                debug!("LLM extraction returned no diseases, falling back to lexicon scan");
            }
            Err(msg) => {
                warn!("{msg}");
                warnings.push(msg);
            }
        }
    }

    // 3. Deterministic lexicon scan
    let candidates = dedup_cap(scan_lexicon(&context), max_candidates);
    ExtractionOutcome { candidates, warnings }
}

async fn llm_extract(
    question: &str,
    context: &str,
    backend: &dyn LlmBackend,
    timeout: Duration,
    max_candidates: usize,
) -> Result<Vec<String>, String> {
    // Bound the context so a large web payload cannot blow the prompt
    let clipped: String = context.chars().take(4_000).collect();
    let req = LlmRequest::new(vec![
        Message::system(
            "You extract disease names from pharma strategy questions. \
             Respond with a JSON array of disease names and nothing else.",
        ),
        Message::user(format!(
            "Question: {question}\n\nContext:\n{clipped}\n\n\
             List up to {max_candidates} candidate diseases as a JSON array of strings."
        )),
    ]);

    let response = tokio::time::timeout(timeout, backend.complete(req))
        .await
        .map_err(|_| {
            format!(
                "LLM candidate extraction timed out after {}s",
                timeout.as_secs()
            )
        })?
        .map_err(|e| format!("LLM candidate extraction failed: {e}"))?;

    Ok(parse_disease_list(&response.content))
}

/// Parse an LLM reply into disease names. Accepts a bare JSON array,
/// an array embedded in prose or code fences, or a dash/star bullet list.
pub fn parse_disease_list(text: &str) -> Vec<String> {
    let cleaned = text.replace("```json", "").replace("```", "");

    if let Ok(names) = serde_json::from_str::<Vec<String>>(cleaned.trim()) {
        return tidy(names);
    }

    if let (Some(start), Some(end)) = (cleaned.find('['), cleaned.rfind(']')) {
        if start < end {
            if let Ok(names) = serde_json::from_str::<Vec<String>>(&cleaned[start..=end]) {
                return tidy(names);
            }
        }
    }

    let bullets: Vec<String> = cleaned
        .lines()
        .filter_map(|l| {
            let l = l.trim();
            l.strip_prefix("- ").or_else(|| l.strip_prefix("* ")).map(str::to_string)
        })
        .collect();
    tidy(bullets)
}

fn tidy(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|n| normalise_candidate(&n))
        .filter(|n| !n.is_empty())
        .collect()
}

/// Scan text for known diseases. Deterministic: results follow lexicon
/// order, not text order.
pub fn scan_lexicon(text: &str) -> Vec<String> {
    let haystack = text.to_lowercase();
    DISEASE_LEXICON
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| mentions(&haystack, kw)))
        .map(|(canonical, _)| canonical.to_string())
        .collect()
}

/// Word-boundary match for single tokens, substring match for phrases.
fn mentions(haystack: &str, keyword: &str) -> bool {
    if keyword.contains(' ') {
        return haystack.contains(keyword);
    }
    let bytes = haystack.as_bytes();
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(keyword) {
        let begin = start + pos;
        let end = begin + keyword.len();
        let before_ok = begin == 0 || !bytes[begin - 1].is_ascii_alphanumeric();
        let after_ok = end == haystack.len() || !bytes[end].is_ascii_alphanumeric();
        if before_ok && after_ok {
            return true;
        }
        start = end;
    }
    false
}

fn dedup_cap(names: Vec<String>, cap: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
        if out.len() == cap {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_finds_mentioned_diseases() {
        let found = scan_lexicon("Compare asthma and COPD burden in emerging markets");
        assert_eq!(found, vec!["COPD".to_string(), "Asthma".to_string()]);
    }

    #[test]
    fn test_scan_respects_word_boundaries() {
        // "tb" must not fire inside "notably"
        let found = scan_lexicon("notably low competition overall");
        assert!(found.is_empty());
        let found = scan_lexicon("drug-resistant TB programs");
        assert_eq!(found, vec!["Tuberculosis".to_string()]);
    }

    #[test]
    fn test_scan_maps_synonyms_to_canonical_name() {
        let found = scan_lexicon("IPF pipeline review");
        assert_eq!(found, vec!["Pulmonary Fibrosis".to_string()]);
    }

    #[test]
    fn test_parse_bare_json_array() {
        let names = parse_disease_list(r#"["COPD", "asthma"]"#);
        assert_eq!(names, vec!["COPD".to_string(), "Asthma".to_string()]);
    }

    #[test]
    fn test_parse_fenced_json_array() {
        let names = parse_disease_list("Here you go:\n```json\n[\"pneumonia\"]\n```");
        assert_eq!(names, vec!["Pneumonia".to_string()]);
    }

    #[test]
    fn test_parse_bullet_list() {
        let names = parse_disease_list("- COPD\n- Pulmonary fibrosis\n");
        assert_eq!(
            names,
            vec!["COPD".to_string(), "Pulmonary Fibrosis".to_string()]
        );
    }

    #[test]
    fn test_parse_garbage_is_empty() {
        assert!(parse_disease_list("I could not determine any.").is_empty());
    }

    #[test]
    fn test_dedup_cap() {
        let names = vec![
            "COPD".to_string(),
            "COPD".to_string(),
            "Asthma".to_string(),
            "ILD".to_string(),
        ];
        assert_eq!(dedup_cap(names, 2), vec!["COPD".to_string(), "Asthma".to_string()]);
    }

    #[tokio::test]
    async fn test_extraction_without_web_or_llm_uses_lexicon() {
        let outcome = extract_candidates(
            "asthma and bronchiectasis options",
            None,
            None,
            &RetryPolicy::default(),
            Duration::from_secs(1),
            5,
        )
        .await;
        assert_eq!(
            outcome.candidates,
            vec!["Asthma".to_string(), "Bronchiectasis".to_string()]
        );
        assert!(outcome.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_extraction_empty_question_yields_nothing() {
        let outcome = extract_candidates(
            "what should we build next?",
            None,
            None,
            &RetryPolicy::default(),
            Duration::from_secs(1),
            5,
        )
        .await;
        assert!(outcome.candidates.is_empty());
    }
}
