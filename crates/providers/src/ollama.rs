//! Ollama provider — native `/api/generate` completion endpoint.
//!
//! Sends one prompt string per request with streaming disabled and reads
//! the `response` field back. Failures are classified into the two
//! provider error kinds the session understands:
//! - model missing on the server → `ProviderError::ModelNotFound`
//! - everything else (unreachable, timeouts, 5xx, bad bodies) → `ProviderError::Connection`

use std::time::Duration;

use async_trait::async_trait;
use ragchat_core::error::ProviderError;
use ragchat_core::provider::{GenerationRequest, Provider};
use serde::Deserialize;
use tracing::{debug, warn};

/// A client for a local or remote Ollama server.
pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    /// Create a new Ollama provider.
    ///
    /// Fails fast when the base URL cannot be parsed; no request is sent.
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|e| {
            ProviderError::Connection(format!("invalid Ollama base URL '{base_url}': {e}"))
        })?;

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ProviderError::Connection(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            model: model.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn model_not_found(model: &str) -> ProviderError {
        ProviderError::ModelNotFound(format!(
            "Model '{model}' not found. Make sure it's available in Ollama."
        ))
    }

    fn request_body(request: &GenerationRequest) -> serde_json::Value {
        let mut options = serde_json::json!({
            "temperature": request.temperature,
        });
        if let Some(max_tokens) = request.max_tokens {
            options["num_predict"] = serde_json::json!(max_tokens);
        }

        serde_json::json!({
            "model": request.model,
            "prompt": request.prompt,
            "stream": false,
            "options": options,
        })
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = Self::request_body(&request);

        debug!(
            model = %request.model,
            prompt_chars = request.prompt.len(),
            "Sending generate request"
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_body, "Ollama returned error");

            if status == reqwest::StatusCode::NOT_FOUND
                || error_body.to_lowercase().contains("not found")
            {
                return Err(Self::model_not_found(&request.model));
            }

            return Err(ProviderError::Connection(format!(
                "Error generating response (status {}): {}",
                status.as_u16(),
                error_body
            )));
        }

        let api_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Connection(format!("Failed to parse response: {e}")))?;

        debug!(response_chars = api_response.response.len(), "Generated response");
        Ok(api_response.response)
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Connection(format!("Failed to parse model list: {e}")))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

// --- Ollama API types (internal) ---

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}
