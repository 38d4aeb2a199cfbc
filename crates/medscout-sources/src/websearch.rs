//! Tavily web-search client.
//!
//! Used two ways:
//!   - by candidate extraction, to pull context text for the heuristic scan
//!   - as a per-candidate adapter contributing citation snippets
//!
//! Without an API key the client degrades to an empty payload instead of
//! failing: web colour is optional, the numeric pipeline is not.

use std::time::Duration;

use async_trait::async_trait;
use medscout_common::{FetchError, Snippet, SourceReport};
use serde::Deserialize;
use tracing::debug;

use crate::SourceAdapter;

const TAVILY_URL: &str = "https://api.tavily.com/search";
const MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPayload {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

impl SearchPayload {
    /// All retrieved text in one string, for keyword scanning.
    pub fn text(&self) -> String {
        let mut parts = vec![self.answer.clone()];
        parts.extend(self.results.iter().map(|r| r.content.clone()));
        parts.join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.answer.is_empty() && self.results.is_empty()
    }
}

#[derive(Clone)]
pub struct TavilyClient {
    api_key: Option<String>,
    client: reqwest::Client,
}

impl TavilyClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { api_key, client }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn search(&self, query: &str) -> Result<SearchPayload, FetchError> {
        let Some(ref key) = self.api_key else {
            debug!("no Tavily API key configured, returning empty search payload");
            return Ok(SearchPayload::default());
        };

        let body = serde_json::json!({
            "api_key":        key,
            "query":          query,
            "max_results":    MAX_RESULTS,
            "include_answer": true,
            "search_depth":   "basic",
            "include_images": false,
        });

        let payload: SearchPayload = self
            .client
            .post(TAVILY_URL)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        debug!(query, n = payload.results.len(), "Tavily results retrieved");
        Ok(payload)
    }
}

pub struct WebSearchAdapter {
    client: TavilyClient,
}

impl WebSearchAdapter {
    pub fn new(client: TavilyClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for WebSearchAdapter {
    fn name(&self) -> &'static str {
        "web_search"
    }

    async fn fetch(&self, candidate: &str, _question: &str) -> Result<SourceReport, FetchError> {
        let query = format!("{candidate} disease burden competitive landscape");
        let payload = self.client.search(&query).await?;

        let mut report = SourceReport::default();
        for hit in payload.results.iter().take(3) {
            if hit.url.is_empty() {
                continue;
            }
            report.snippets.push(Snippet {
                candidate: candidate.to_string(),
                text: format!("{} | {}", hit.title, hit.url),
                source: "web".to_string(),
            });
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_text_concatenates_answer_and_results() {
        let payload = SearchPayload {
            answer: "COPD burden is rising".into(),
            results: vec![SearchHit {
                title: "t".into(),
                url: "u".into(),
                content: "asthma competition".into(),
            }],
        };
        let text = payload.text();
        assert!(text.contains("COPD burden"));
        assert!(text.contains("asthma competition"));
    }

    #[tokio::test]
    async fn test_unconfigured_client_degrades_to_empty() {
        let client = TavilyClient::new(None, Duration::from_secs(5));
        assert!(!client.is_configured());
        let payload = client.search("respiratory diseases").await.unwrap();
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn test_adapter_with_no_key_yields_empty_report() {
        let adapter = WebSearchAdapter::new(TavilyClient::new(None, Duration::from_secs(5)));
        let report = adapter.fetch("COPD", "q").await.unwrap();
        assert!(report.is_empty());
    }
}
