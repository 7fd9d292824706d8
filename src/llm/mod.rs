//! Local language-model provider
//!
//! Wraps the Ollama completion API behind the [`CompletionProvider`] trait.
//! The model itself is hosted by the external Ollama process; this module
//! holds only an HTTP client with fixed sampling settings.

pub mod prompt;

use crate::config::LlmConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Stop sequences preventing the model from hallucinating a multi-turn
/// continuation after the `Answer:` cue.
const STOP_SEQUENCES: [&str; 2] = ["User:", "Assistant:"];

/// Client-side bound on one completion call, in seconds
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Text-completion capability
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a completion for the prompt, trimmed of surrounding whitespace.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Validate connection to the provider
    async fn validate_connection(&self) -> Result<(), ProviderError>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Ollama provider (local models over HTTP)
pub struct OllamaProvider {
    config: LlmConfig,
    client: Client,
}

impl OllamaProvider {
    pub fn new(config: LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self { config, client }
    }
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: usize,
    num_ctx: usize,
    stop: Vec<String>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
    #[allow(dead_code)]
    done: bool,
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.config.url);

        let request = OllamaRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
                num_ctx: self.config.context_window,
                stop: STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ProviderError::ConnectionError(format!("Cannot reach Ollama at {}: {}", url, e))
                } else {
                    ProviderError::HttpError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ModelError(format!(
                "Ollama returned HTTP {}: {}",
                status, body
            )));
        }

        let completion: OllamaResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(completion.response.trim().to_string())
    }

    async fn validate_connection(&self) -> Result<(), ProviderError> {
        let url = format!("{}/api/tags", self.config.url);
        let response = self.client.get(&url).send().await.map_err(|e| {
            ProviderError::ConnectionError(format!("Cannot reach Ollama at {}: {}", self.config.url, e))
        })?;

        if !response.status().is_success() {
            return Err(ProviderError::ConnectionError(format!(
                "Ollama health check returned HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
