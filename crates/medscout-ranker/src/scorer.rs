//! Composite opportunity score computation.
//!
//! Pure and deterministic: no I/O, identical inputs produce identical
//! ordering. For each weighted metric the column is min-max normalised
//! across all candidates, then combined as a signed weighted sum:
//!
//!   w >= 0  →  contribution = w * n         (high values rewarded)
//!   w <  0  →  contribution = |w| * (1 - n) (low values rewarded)
//!
//! A column with no spread carries no information and contributes 0 for
//! every candidate. With absolute weights summing to 1 the composite
//! score lands in [0, 1].

use std::collections::BTreeMap;

use medscout_common::{AggregatedRow, ScoredRow};
use tracing::debug;

use crate::normalise::minmax_column;
use crate::weights::WeightTable;

/// Score and rank aggregated rows. Returns rows sorted by descending
/// score; ties are broken by candidate name ascending so repeated runs
/// over the same data produce the same order.
pub fn score_rows(rows: Vec<AggregatedRow>, weights: &WeightTable) -> Vec<ScoredRow> {
    if rows.is_empty() {
        return vec![];
    }

    let mut weights = weights.clone();
    if !weights.validate() {
        debug!("weight table does not sum to 1.0, renormalising");
        weights.normalise();
    }

    // Column-wise normalisation over every weighted metric. Metrics a
    // row is missing read as zero (pre-filled upstream policy).
    let mut columns: BTreeMap<String, (Vec<f64>, bool)> = BTreeMap::new();
    for (metric, _) in weights.iter() {
        let raw: Vec<f64> = rows.iter().map(|r| r.metric(metric)).collect();
        let lo = raw.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let has_spread = (hi - lo).abs() > 1e-12;
        columns.insert(metric.clone(), (minmax_column(&raw), has_spread));
    }

    let mut scored: Vec<ScoredRow> = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let mut components = BTreeMap::new();
            let mut score = 0.0;
            for (metric, &w) in weights.iter() {
                let (normed, has_spread) = &columns[metric];
                let n = normed[i];
                components.insert(metric.clone(), n);
                if !has_spread {
                    continue;
                }
                score += if w >= 0.0 { w * n } else { -w * (1.0 - n) };
            }
            ScoredRow {
                candidate: row.candidate,
                score: score.clamp(0.0, 1.0),
                metrics: row.metrics,
                components,
                snippets: row.snippets,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.candidate.cmp(&b.candidate))
    });

    scored
}
