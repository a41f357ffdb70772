//! Provider trait — the abstraction over text-generation backends.
//!
//! A Provider receives one fully assembled prompt string and returns the
//! generated text. Prompt assembly happens entirely in `ragchat-agent`, so a
//! provider never sees conversation structure.
//!
//! Implementations: Ollama (`ragchat-providers`), scripted mocks in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;

/// Prompt sent to the health check.
pub const HEALTH_CHECK_PROMPT: &str = "Hello";

/// A single generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The model to use (e.g., "llama2", "mistral")
    pub model: String,

    /// The complete prompt
    pub prompt: String,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// The core Provider trait.
///
/// The session calls `generate()` without knowing which backend is behind it.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "ollama").
    fn name(&self) -> &str;

    /// The model used for generation and health checks.
    fn model(&self) -> &str;

    /// Send a prompt and get the complete generated text.
    async fn generate(&self, request: GenerationRequest) -> std::result::Result<String, ProviderError>;

    /// List models available on the backend.
    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        Ok(Vec::new())
    }

    /// Health check — sends a trivial prompt and reports success only.
    async fn health_check(&self) -> bool {
        let request = GenerationRequest::new(self.model(), HEALTH_CHECK_PROMPT);
        match self.generate(request).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(provider = %self.name(), error = %e, "Health check failed");
                false
            }
        }
    }
}
