//! Canned API trade source (EXIM-style export/import tonnage).
//!
//! Deterministic stand-in for customs trade statistics on active
//! pharmaceutical ingredients. Diseases missing from the table report
//! zero trade rather than failing: absence of trade data is a real and
//! common situation, not an unsatisfiable request.

use async_trait::async_trait;
use medscout_common::records::metrics;
use medscout_common::{FetchError, SourceReport};

use crate::SourceAdapter;

/// (disease, API exports tonnes/yr, API imports tonnes/yr)
const TRADE_TABLE: &[(&str, f64, f64)] = &[
    ("copd", 120.0, 310.0),
    ("asthma", 145.0, 420.0),
    ("ild", 8.0, 65.0),
    ("pulmonary fibrosis", 6.0, 52.0),
    ("bronchiectasis", 3.0, 18.0),
    ("tuberculosis", 480.0, 95.0),
    ("pneumonia", 210.0, 160.0),
];

#[derive(Debug, Default)]
pub struct TradeDataAdapter;

impl TradeDataAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SourceAdapter for TradeDataAdapter {
    fn name(&self) -> &'static str {
        "trade"
    }

    async fn fetch(&self, candidate: &str, _question: &str) -> Result<SourceReport, FetchError> {
        let key = candidate.trim().to_lowercase();
        let (exports, imports) = TRADE_TABLE
            .iter()
            .find(|(name, _, _)| *name == key)
            .map(|(_, e, i)| (*e, *i))
            .unwrap_or((0.0, 0.0));

        let mut report = SourceReport::default();
        report.metrics.insert(metrics::API_EXPORTS_TONNES.into(), exports);
        report.metrics.insert(metrics::API_IMPORTS_TONNES.into(), imports);
        Ok(report)
    }
}
