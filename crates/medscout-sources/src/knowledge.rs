//! Internal research-notes lookup.
//!
//! Keyword-overlap retrieval over an in-memory note store, standing in for
//! the internal knowledge base. Returns the best-matching note excerpts as
//! citation snippets; contributes no numeric metrics.

use async_trait::async_trait;
use medscout_common::{FetchError, Snippet, SourceReport};

use crate::SourceAdapter;

const MAX_SNIPPETS: usize = 2;
const EXCERPT_LEN: usize = 140;

#[derive(Debug, Clone)]
pub struct Note {
    pub source: String,
    pub text: String,
}

pub struct ResearchNotesAdapter {
    notes: Vec<Note>,
}

impl ResearchNotesAdapter {
    pub fn new(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    /// A small built-in memo set so the pipeline produces internal
    /// references out of the box.
    pub fn with_default_notes() -> Self {
        let notes = vec![
            Note {
                source: "memo-2023-04-copd-devices.md".into(),
                text: "COPD inhalation device program paused in 2023 after formulation \
                       stability issues; reviewers flagged strong generics pressure from \
                       three large competitors in maintenance therapy."
                    .into(),
            },
            Note {
                source: "memo-2022-11-asthma-biologics.md".into(),
                text: "Asthma biologics landscape review: severe eosinophilic segment \
                       crowded, but paediatric adherence remains an unmet need worth \
                       revisiting once the device platform matures."
                    .into(),
            },
            Note {
                source: "memo-2024-01-fibrosis.md".into(),
                text: "Pulmonary fibrosis screening collaboration produced two \
                       antifibrotic leads with novel mechanism; competitive intensity \
                       low, regulatory path via orphan designation looks viable."
                    .into(),
            },
            Note {
                source: "memo-2021-06-tb-regimen.md".into(),
                text: "Tuberculosis shorter-regimen feasibility study: procurement is \
                       dominated by public programs, pricing headroom minimal."
                    .into(),
            },
        ];
        Self { notes }
    }

    fn score_note(note: &Note, candidate: &str, question: &str) -> usize {
        let hay = note.text.to_lowercase();
        let mut score = 0;
        for word in candidate.split_whitespace() {
            if hay.contains(&word.to_lowercase()) {
                score += 3;
            }
        }
        for word in question.split_whitespace().filter(|w| w.len() > 4) {
            if hay.contains(&word.to_lowercase()) {
                score += 1;
            }
        }
        score
    }
}

#[async_trait]
impl SourceAdapter for ResearchNotesAdapter {
    fn name(&self) -> &'static str {
        "research_notes"
    }

    async fn fetch(&self, candidate: &str, question: &str) -> Result<SourceReport, FetchError> {
        let mut scored: Vec<(usize, &Note)> = self
            .notes
            .iter()
            .map(|n| (Self::score_note(n, candidate, question), n))
            .filter(|(s, _)| *s > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let mut report = SourceReport::default();
        for (_, note) in scored.into_iter().take(MAX_SNIPPETS) {
            let excerpt: String = note.text.chars().take(EXCERPT_LEN).collect();
            report.snippets.push(Snippet {
                candidate: candidate.to_string(),
                text: excerpt,
                source: note.source.clone(),
            });
        }
        Ok(report)
    }
}
