//! Generation backend implementations for ragchat.
//!
//! All providers implement the `ragchat_core::Provider` trait.

pub mod ollama;

pub use ollama::OllamaProvider;

use ragchat_config::ChatConfig;
use ragchat_core::error::ProviderError;

/// Build the configured provider.
pub fn build_from_config(config: &ChatConfig) -> Result<OllamaProvider, ProviderError> {
    OllamaProvider::new(
        &config.ollama_base_url,
        &config.model_name,
        std::time::Duration::from_secs(config.request_timeout_secs),
    )
}
