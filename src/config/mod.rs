//! Configuration system for leadscope
//!
//! Supports loading configuration from:
//! 1. CLI --config argument
//! 2. ~/.config/leadscope/config.json
//! 3. Default values
//!
//! Environment variables override config file values:
//! - LEADSCOPE_API_URL
//! - LEADSCOPE_OLLAMA_URL
//! - LEADSCOPE_MODEL
//! - LEADSCOPE_DATA_DIR

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Lead-search API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadApiConfig {
    /// Streaming endpoint URL
    #[serde(default = "default_api_url")]
    pub url: String,

    /// Wall-clock bound on the whole streaming request, in seconds
    #[serde(default = "default_stream_timeout")]
    pub timeout_secs: u64,
}

impl Default for LeadApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            timeout_secs: default_stream_timeout(),
        }
    }
}

/// Company-website scraping settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Per-request timeout, in seconds
    #[serde(default = "default_scrape_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every fetch
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_scrape_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Retrieval pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum characters per chunk
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Word-count boundary below which the whole corpus is stuffed directly
    /// into the prompt. Tuned jointly with the model context window: ~700
    /// words stays inside num_ctx 2048 with 400 tokens reserved for output.
    #[serde(default = "default_word_threshold")]
    pub word_threshold: usize,

    /// Number of nearest chunks handed to the prompt builder
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            word_threshold: default_word_threshold(),
            top_k: default_top_k(),
        }
    }
}

/// Local language-model settings (Ollama)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Ollama API URL
    #[serde(default = "default_ollama_url")]
    pub url: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature; low for low-variance factual answers
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Model context window
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            context_window: default_context_window(),
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Data directory for session, corpus snapshot and index files
    /// (default: ~/.local/share/leadscope)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub api: LeadApiConfig,

    #[serde(default)]
    pub scrape: ScrapeConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,
}

fn default_api_url() -> String {
    "https://api.saasquatchleads.com/scraper/scrape-stream".to_string()
}

fn default_stream_timeout() -> u64 {
    90
}

fn default_scrape_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36"
        .to_string()
}

fn default_max_chunk_chars() -> usize {
    500
}

fn default_word_threshold() -> usize {
    700
}

fn default_top_k() -> usize {
    3
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama2:7b-chat".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> usize {
    400
}

fn default_context_window() -> usize {
    2048
}

impl AppConfig {
    /// Load configuration with the documented priority order
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Default config file location
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("leadscope")
            .join("config.json")
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("LEADSCOPE_API_URL") {
            self.api.url = url;
        }
        if let Ok(url) = std::env::var("LEADSCOPE_OLLAMA_URL") {
            self.llm.url = url;
        }
        if let Ok(model) = std::env::var("LEADSCOPE_MODEL") {
            self.llm.model = model;
        }
        if let Ok(dir) = std::env::var("LEADSCOPE_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Resolve the data directory, falling back to the platform default
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("leadscope")
        })
    }

    /// Validate configuration before use
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.url.is_empty() {
            return Err(ConfigError::ValidationError(
                "api.url must not be empty".to_string(),
            ));
        }
        if self.llm.url.is_empty() || self.llm.model.is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.url and llm.model must not be empty".to_string(),
            ));
        }
        if self.retrieval.max_chunk_chars == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.max_chunk_chars must be positive".to_string(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be positive".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::ValidationError(format!(
                "llm.temperature {} outside 0.0..=2.0",
                self.llm.temperature
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.word_threshold, 700);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.max_chunk_chars, 500);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "retrieval": { "top_k": 5 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.word_threshold, 700);
        assert_eq!(config.llm.temperature, 0.3);
    }

    #[test]
    fn test_invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.llm.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let mut config = AppConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }
}
