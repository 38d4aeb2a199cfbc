//! Canned patent-landscape source (USPTO-style filing counts).
//!
//! Deterministic stand-in for a patent search service. Reports recent
//! filing pressure (crowding signal) and the shortest time until a key
//! patent expires (generic-entry opportunity signal).

use async_trait::async_trait;
use medscout_common::records::metrics;
use medscout_common::{FetchError, SourceReport};

use crate::SourceAdapter;

/// (disease, filings in last 5 years, years until key patents expire)
const PATENT_TABLE: &[(&str, f64, f64)] = &[
    ("copd", 25.0, 3.0),
    ("asthma", 42.0, 6.0),
    ("ild", 18.0, 2.0),
    ("pulmonary fibrosis", 16.0, 2.0),
    ("bronchiectasis", 5.0, 1.0),
    ("tuberculosis", 8.0, 1.0),
    ("pneumonia", 15.0, 4.0),
];

#[derive(Debug, Default)]
pub struct PatentAdapter;

impl PatentAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SourceAdapter for PatentAdapter {
    fn name(&self) -> &'static str {
        "patents"
    }

    async fn fetch(&self, candidate: &str, _question: &str) -> Result<SourceReport, FetchError> {
        let key = candidate.trim().to_lowercase();
        let (filings, expiry_years) = PATENT_TABLE
            .iter()
            .find(|(name, _, _)| *name == key)
            .map(|(_, f, y)| (*f, *y))
            .ok_or_else(|| {
                FetchError::terminal(format!("no patent landscape for disease: {candidate}"))
            })?;

        let mut report = SourceReport::default();
        report
            .metrics
            .insert(metrics::PATENT_FILINGS_LAST_5Y.into(), filings);
        report
            .metrics
            .insert(metrics::KEY_PATENTS_EXPIRING_IN_YEARS.into(), expiry_years);
        Ok(report)
    }
}
