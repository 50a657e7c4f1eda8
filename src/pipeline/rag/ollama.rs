//! Ollama HTTP client for local LLM inference, exposed to the pipeline as
//! an `LlmGenerate` implementation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::orchestrator::LlmGenerate;
use super::RagError;

/// Ollama client bound to one model and sampling temperature.
pub struct OllamaClient {
    base_url: String,
    model: String,
    temperature: f32,
    client: reqwest::blocking::Client,
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl OllamaClient {
    /// Create a client. `timeout` of `None` leaves requests unbounded.
    pub fn new(
        base_url: &str,
        model: &str,
        temperature: f32,
        timeout: Option<Duration>,
    ) -> Result<Self, RagError> {
        // Overrides reqwest's 30s blocking default.
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagError::GenerationFailure(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    fn transport_error(&self, e: reqwest::Error) -> RagError {
        if e.is_connect() {
            RagError::GenerationFailure(format!("Ollama is not running at {}", self.base_url))
        } else if e.is_timeout() {
            RagError::GenerationFailure("Ollama request timed out".to_string())
        } else {
            RagError::GenerationFailure(e.to_string())
        }
    }
}

impl LlmGenerate for OllamaClient {
    fn generate(&self, prompt: &str) -> Result<String, RagError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RagError::GenerationFailure(format!(
                "Ollama returned error (status {}): {body}",
                status.as_u16()
            )));
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .map_err(|e| RagError::GenerationFailure(format!("Response parsing: {e}")))?;

        Ok(parsed.response)
    }
}
