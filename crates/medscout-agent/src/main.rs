//! Medscout — pharma opportunity scout.
//! CLI entry point: runs one question through the query pipeline and
//! prints the ranked result as JSON.

mod config;

use std::sync::Arc;
use std::time::Duration;

use medscout_llm::backend::{GeminiBackend, OllamaBackend, OpenAiCompatibleBackend};
use medscout_llm::LlmBackend;
use medscout_pipeline::{run_query, PipelineContext};
use medscout_sources::clinicaltrials::ClinicalTrialsAdapter;
use medscout_sources::knowledge::ResearchNotesAdapter;
use medscout_sources::market::MarketDataAdapter;
use medscout_sources::patents::PatentAdapter;
use medscout_sources::trade::TradeDataAdapter;
use medscout_sources::websearch::{TavilyClient, WebSearchAdapter};
use medscout_sources::SourceAdapter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn build_llm_backend(cfg: &config::LlmConfig) -> Option<Arc<dyn LlmBackend>> {
    match cfg.provider.as_str() {
        "ollama" => Some(Arc::new(OllamaBackend::new(&cfg.base_url, &cfg.model))),

        "openai_compatible" => {
            let key = if cfg.api_key.is_empty() {
                std::env::var("MEDSCOUT_LLM_API_KEY").ok()
            } else {
                Some(cfg.api_key.clone())
            };
            Some(Arc::new(OpenAiCompatibleBackend::new(&cfg.base_url, &cfg.model, key)))
        }

        "gemini" => {
            let key = if cfg.api_key.is_empty() {
                std::env::var("MEDSCOUT_GEMINI_API_KEY").unwrap_or_default()
            } else {
                cfg.api_key.clone()
            };
            if key.is_empty() {
                warn!(
                    "Gemini configured but no API key found (set llm.api_key or \
                     MEDSCOUT_GEMINI_API_KEY); synthesis will use the deterministic fallback"
                );
                return None;
            }
            Some(Arc::new(GeminiBackend::new(key, &cfg.model)))
        }

        "none" => None,

        other => {
            warn!("unknown LLM provider '{other}'; synthesis will use the deterministic fallback");
            None
        }
    }
}

fn build_adapters(call_timeout: Duration, tavily: &TavilyClient) -> Vec<Arc<dyn SourceAdapter>> {
    vec![
        Arc::new(ClinicalTrialsAdapter::new(call_timeout)),
        Arc::new(MarketDataAdapter::new()),
        Arc::new(TradeDataAdapter::new()),
        Arc::new(PatentAdapter::new()),
        Arc::new(WebSearchAdapter::new(tavily.clone())),
        Arc::new(ResearchNotesAdapter::with_default_notes()),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("medscout=debug,info")),
        )
        .init();

    info!("Medscout starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = match config::Config::load() {
        Ok(c) => {
            info!("Configuration loaded. LLM provider: {}", c.llm.provider);
            c
        }
        Err(e) => {
            warn!("Could not load medscout.toml: {e}");
            warn!("Continuing with built-in defaults.");
            config::Config::default()
        }
    };

    let question = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let question = if question.trim().is_empty() {
        "Which respiratory diseases combine high patient burden with low competition?"
            .to_string()
    } else {
        question
    };

    let tavily_key = if config.search.tavily_api_key.is_empty() {
        std::env::var("MEDSCOUT_TAVILY_API_KEY").ok()
    } else {
        Some(config.search.tavily_api_key.clone())
    };
    if tavily_key.is_none() {
        warn!("No Tavily API key configured; web search will contribute nothing");
    }
    let tavily = TavilyClient::new(tavily_key, config.pipeline.call_timeout());

    let adapters = build_adapters(config.pipeline.call_timeout(), &tavily);
    info!(n = adapters.len(), "source adapters registered");

    let mut ctx = PipelineContext::new(&config.pipeline, config.weights.clone(), adapters)
        .with_web_search(tavily);
    if let Some(backend) = build_llm_backend(&config.llm) {
        info!(model = backend.model_id(), local = backend.is_local(), "LLM backend ready");
        ctx = ctx.with_llm(backend);
    }

    let result = run_query(&question, &ctx).await?;

    info!(
        elapsed_ms = result.processing_time_ms,
        n_ranked = result.ranked.len(),
        n_warnings = result.warnings.len(),
        "query finished"
    );
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
