//! Ollama inference client.
//!
//! Issues one `POST {base_url}/api/generate` per prompt with
//! `{"model", "prompt", "stream": false}` and returns the `response` field
//! of the JSON answer.

use super::InferenceClient;
use crate::config::{DEFAULT_BASE_URL, DEFAULT_MODEL, ModelSettings};
use crate::error::InferenceError;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Path of the non-chat completion endpoint.
const GENERATE_PATH: &str = "/api/generate";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// Configuration for the Ollama client.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// The model to use (e.g., "mistral", "codellama").
    pub model: String,
    /// Server base URL (e.g., "http://localhost:11434").
    pub base_url: String,
    /// Request timeout in seconds; `None` waits for the model indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
        }
    }
}

impl From<&ModelSettings> for OllamaConfig {
    fn from(settings: &ModelSettings) -> Self {
        Self {
            model: settings.model_name.clone(),
            base_url: settings.base_url.clone(),
            timeout_secs: settings.request_timeout_secs,
        }
    }
}

impl OllamaConfig {
    /// Create a new configuration builder.
    pub fn builder() -> OllamaConfigBuilder {
        OllamaConfigBuilder::default()
    }

    /// Full URL of the generate endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), GENERATE_PATH)
    }
}

/// Builder for [`OllamaConfig`].
#[derive(Default)]
pub struct OllamaConfigBuilder {
    model: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl OllamaConfigBuilder {
    /// Set the model to use.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the server base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the request timeout in seconds.
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OllamaConfig {
        OllamaConfig {
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Client for a locally hosted Ollama server.
///
/// # Example
///
/// ```rust,ignore
/// use watch_analyst::ai::{InferenceClient, OllamaClient};
///
/// let client = OllamaClient::new()?;
/// let answer = client.generate("Hallo")?;
/// ```
pub struct OllamaClient {
    config: OllamaConfig,
    client: Client,
}

static_assertions::assert_impl_all!(OllamaClient: Send, Sync);

impl OllamaClient {
    /// Create a client for the default model on the default local endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, InferenceError> {
        Self::with_config(OllamaConfig::default())
    }

    /// Create a client with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_config(config: OllamaConfig) -> Result<Self, InferenceError> {
        let timeout: Option<Duration> = config.timeout_secs.map(Duration::from_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// The active configuration.
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn extract_completion(body: &str) -> Result<String, InferenceError> {
        let parsed: GenerateResponse = serde_json::from_str(body)
            .map_err(|e| InferenceError::Protocol(format!("invalid JSON from endpoint: {e}")))?;

        parsed
            .response
            .ok_or_else(|| InferenceError::Protocol("response field missing".to_string()))
    }
}

impl InferenceClient for OllamaClient {
    fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
        };

        let url = self.config.generate_url();
        debug!(%url, model = %self.config.model, prompt_len = prompt.len(), "Sending generate request");

        let response = self.client.post(&url).json(&request).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text()?;
        let completion = Self::extract_completion(&body)?;
        debug!(completion_len = completion.len(), "Received completion");
        Ok(completion)
    }

    fn name(&self) -> &str {
        "Ollama"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.config.model)
    }
}
