//! ClinicalTrials.gov v2 API client.
//!
//! API docs: https://clinicaltrials.gov/data-api/api
//! Endpoint: https://clinicaltrials.gov/api/v2/studies
//!
//! Queries studies for a candidate condition and reduces them to the
//! competition metrics the scorer consumes:
//!   phase2_trials — studies listing PHASE2
//!   phase3_trials — studies listing PHASE3
//!   trials_total  — totalCount reported by the API

use std::time::Duration;

use async_trait::async_trait;
use medscout_common::records::metrics;
use medscout_common::{FetchError, SourceReport};
use tracing::debug;

use crate::SourceAdapter;

const CT_API_URL: &str = "https://clinicaltrials.gov/api/v2/studies";
const PAGE_SIZE: usize = 100;

pub struct ClinicalTrialsAdapter {
    client: reqwest::Client,
}

impl ClinicalTrialsAdapter {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    async fn search_studies(&self, condition: &str) -> Result<serde_json::Value, FetchError> {
        let page_size = PAGE_SIZE.to_string();
        let resp = self
            .client
            .get(CT_API_URL)
            .query(&[
                ("query.cond", condition),
                ("pageSize", page_size.as_str()),
                ("countTotal", "true"),
                ("format", "json"),
                ("fields", "NCTId,BriefTitle,Phase,OverallStatus"),
            ])
            .send()
            .await?
            .json::<serde_json::Value>()
            .await?;
        Ok(resp)
    }
}

impl Default for ClinicalTrialsAdapter {
    fn default() -> Self {
        Self::new(Duration::from_secs(20))
    }
}

/// Count studies listing PHASE2 / PHASE3. A study declaring both phases
/// counts towards both totals.
fn phase_counts(studies: &[serde_json::Value]) -> (u64, u64) {
    let mut phase2 = 0u64;
    let mut phase3 = 0u64;
    for study in studies {
        let phases = study["protocolSection"]["designModule"]["phases"]
            .as_array()
            .cloned()
            .unwrap_or_default();
        let listed: Vec<&str> = phases.iter().filter_map(|p| p.as_str()).collect();
        if listed.iter().any(|p| *p == "PHASE2") {
            phase2 += 1;
        }
        if listed.iter().any(|p| *p == "PHASE3") {
            phase3 += 1;
        }
    }
    (phase2, phase3)
}

#[async_trait]
impl SourceAdapter for ClinicalTrialsAdapter {
    fn name(&self) -> &'static str {
        "clinical_trials"
    }

    async fn fetch(&self, candidate: &str, _question: &str) -> Result<SourceReport, FetchError> {
        let resp = self.search_studies(candidate).await?;

        let studies = resp["studies"].as_array().cloned().unwrap_or_default();
        let (phase2, phase3) = phase_counts(&studies);
        // totalCount covers the full result set even when it exceeds one page
        let total = resp["totalCount"].as_u64().unwrap_or(studies.len() as u64);

        debug!(
            candidate,
            n = studies.len(),
            total,
            "ClinicalTrials.gov studies retrieved"
        );

        let mut report = SourceReport::default();
        report.metrics.insert(metrics::PHASE2_TRIALS.into(), phase2 as f64);
        report.metrics.insert(metrics::PHASE3_TRIALS.into(), phase3 as f64);
        report.metrics.insert(metrics::TRIALS_TOTAL.into(), total as f64);
        Ok(report)
    }
}
