//! Signed weight table for opportunity scoring.
//!
//! Sign convention: a positive weight rewards high values of a metric
//! (market size), a negative weight rewards low values (competitor
//! count, trial crowding). The absolute values sum to 1.0 so the
//! composite score stays within [0, 1].

use std::collections::BTreeMap;

use medscout_common::records::metrics;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable {
    weights: BTreeMap<String, f64>,
}

impl Default for WeightTable {
    /// Initial expert prior: burden (market size) rewarded, competition
    /// (competitors, late-phase trials, filing pressure) penalised,
    /// near-term patent expiry and export capability mildly rewarded.
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert(metrics::MARKET_SIZE_USD.to_string(), 0.35);
        weights.insert(metrics::COMPETITOR_COUNT.to_string(), -0.25);
        weights.insert(metrics::PHASE2_TRIALS.to_string(), -0.10);
        weights.insert(metrics::PHASE3_TRIALS.to_string(), -0.15);
        weights.insert(metrics::PATENT_FILINGS_LAST_5Y.to_string(), -0.05);
        weights.insert(metrics::KEY_PATENTS_EXPIRING_IN_YEARS.to_string(), 0.05);
        weights.insert(metrics::API_EXPORTS_TONNES.to_string(), 0.05);
        Self { weights }
    }
}

impl WeightTable {
    pub fn new(weights: BTreeMap<String, f64>) -> Self {
        Self { weights }
    }

    /// Validate that the absolute weights sum to ~1.0.
    pub fn validate(&self) -> bool {
        (self.abs_sum() - 1.0).abs() < 1e-6
    }

    /// Renormalise so absolute weights sum to 1.0. Signs are preserved.
    pub fn normalise(&mut self) {
        let sum = self.abs_sum();
        if sum > 0.0 {
            for w in self.weights.values_mut() {
                *w /= sum;
            }
        }
    }

    pub fn get(&self, metric: &str) -> Option<f64> {
        self.weights.get(metric).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.weights.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    fn abs_sum(&self) -> f64 {
        self.weights.values().map(|w| w.abs()).sum()
    }
}
