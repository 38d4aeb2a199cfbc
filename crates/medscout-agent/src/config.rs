//! Configuration loading for Medscout.
//! Reads medscout.toml from the current directory or the path in the
//! MEDSCOUT_CONFIG env var. Every field is defaulted so the binary also
//! runs with no config file at all.

use std::path::Path;

use medscout_pipeline::PipelineConfig;
use medscout_ranker::WeightTable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Signed per-metric weights; absolute values are renormalised to
    /// sum to 1.0 at scoring time.
    #[serde(default)]
    pub weights: WeightTable,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" | "openai_compatible" | "gemini" | "none"
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Used by ollama and openai_compatible providers.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Empty means: take MEDSCOUT_LLM_API_KEY from the environment.
    #[serde(default)]
    pub api_key: String,
}

fn default_llm_provider() -> String { "none".to_string() }
fn default_llm_model() -> String { "llama3:8b".to_string() }
fn default_llm_base_url() -> String { "http://localhost:11434".to_string() }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            base_url: default_llm_base_url(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchConfig {
    /// Empty means: take MEDSCOUT_TAVILY_API_KEY from the environment.
    #[serde(default)]
    pub tavily_api_key: String,
}

impl Config {
    /// Load configuration from medscout.toml.
    /// Checks MEDSCOUT_CONFIG first, then the current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("MEDSCOUT_CONFIG")
            .unwrap_or_else(|_| "medscout.toml".to_string());

        if !Path::new(&path).exists() {
            anyhow::bail!(
                "Config file not found: {}\n\
                 Copy medscout.example.toml to medscout.toml and edit it.",
                path
            );
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
