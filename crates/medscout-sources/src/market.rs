//! Canned market-intelligence source (IQVIA-style figures).
//!
//! Deterministic lookup table standing in for a commercial market-data
//! feed. Figures are indicative, not real. An unknown candidate is a
//! terminal failure: re-asking the table will never produce data.

use async_trait::async_trait;
use medscout_common::records::metrics;
use medscout_common::{FetchError, SourceReport};

use crate::SourceAdapter;

/// (disease, market size in USD, marketed competitor count)
const MARKET_TABLE: &[(&str, f64, f64)] = &[
    ("copd", 2.5e9, 12.0),
    ("asthma", 3.2e9, 18.0),
    ("ild", 0.85e9, 4.0),
    ("pulmonary fibrosis", 0.9e9, 5.0),
    ("bronchiectasis", 0.4e9, 3.0),
    ("tuberculosis", 1.8e9, 9.0),
    ("pneumonia", 2.1e9, 11.0),
];

#[derive(Debug, Default)]
pub struct MarketDataAdapter;

impl MarketDataAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn lookup(candidate: &str) -> Option<(f64, f64)> {
    let key = candidate.trim().to_lowercase();
    MARKET_TABLE
        .iter()
        .find(|(name, _, _)| *name == key)
        .map(|(_, size, competitors)| (*size, *competitors))
}

#[async_trait]
impl SourceAdapter for MarketDataAdapter {
    fn name(&self) -> &'static str {
        "market"
    }

    async fn fetch(&self, candidate: &str, _question: &str) -> Result<SourceReport, FetchError> {
        let (market_size, competitors) = lookup(candidate).ok_or_else(|| {
            FetchError::terminal(format!("no market data for disease: {candidate}"))
        })?;

        let mut report = SourceReport::default();
        report.metrics.insert(metrics::MARKET_SIZE_USD.into(), market_size);
        report.metrics.insert(metrics::COMPETITOR_COUNT.into(), competitors);
        Ok(report)
    }
}
