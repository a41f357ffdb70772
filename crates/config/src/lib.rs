//! Configuration loading, validation, and management for ragchat.
//!
//! Loads configuration from `~/.ragchat/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Max tokens applied by `--long-responses`.
pub const LONG_RESPONSE_MAX_TOKENS: u32 = 4000;

/// The root configuration structure.
///
/// Maps directly to `~/.ragchat/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Base URL of the Ollama server
    #[serde(default = "default_ollama_base_url")]
    pub ollama_base_url: String,

    /// Model used for generation
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Sampling temperature, 0.0 to 1.0
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Seeded into memory at session start and after every reset.
    /// Empty disables the system message.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Number of user/assistant pairs kept in conversation memory
    #[serde(default = "default_memory_limit")]
    pub conversation_memory_limit: usize,

    /// HTTP timeout for backend requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retrieval configuration
    #[serde(default)]
    pub rag: RagConfig,
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".into()
}
fn default_model_name() -> String {
    "llama2".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2000
}
fn default_system_prompt() -> String {
    "You are a helpful assistant. Respond in a friendly and informative manner.".into()
}
fn default_memory_limit() -> usize {
    10
}
fn default_request_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// JSON knowledge file; created with a default entry when absent
    #[serde(default = "default_knowledge_file")]
    pub knowledge_file: PathBuf,

    /// Results injected per turn
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Minimum keyword-overlap score for injected results
    #[serde(default = "default_min_relevance")]
    pub min_relevance: f32,
}

fn default_true() -> bool {
    true
}
fn default_knowledge_file() -> PathBuf {
    PathBuf::from("data/knowledge.json")
}
fn default_max_results() -> usize {
    3
}
fn default_min_relevance() -> f32 {
    0.1
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            knowledge_file: default_knowledge_file(),
            max_results: default_max_results(),
            min_relevance: default_min_relevance(),
        }
    }
}

impl ChatConfig {
    /// Load configuration from the default path (~/.ragchat/config.toml).
    ///
    /// Environment variables override file values:
    /// - `OLLAMA_BASE_URL`, `OLLAMA_MODEL`
    /// - `RAGCHAT_TEMPERATURE`, `RAGCHAT_MAX_TOKENS`, `RAGCHAT_SYSTEM_PROMPT`
    /// - `RAGCHAT_MEMORY_LIMIT`, `RAGCHAT_RAG_ENABLED`, `RAGCHAT_KNOWLEDGE_FILE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from `path`, then apply environment overrides and validate.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load_layered(path)?;
        config.validate()?;
        Ok(config)
    }

    /// File plus environment overrides, not yet validated, so later layers
    /// such as command-line flags can still correct out-of-range values.
    pub fn load_layered(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// Values are not range-checked here; call `validate()` once every
    /// override layer has been applied.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Takes the lookup as a closure so tests don't touch process state.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.ollama_base_url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.model_name = model;
        }
        if let Some(raw) = lookup("RAGCHAT_TEMPERATURE") {
            self.temperature = parse_env("RAGCHAT_TEMPERATURE", &raw)?;
        }
        if let Some(raw) = lookup("RAGCHAT_MAX_TOKENS") {
            self.max_tokens = parse_env("RAGCHAT_MAX_TOKENS", &raw)?;
        }
        if let Some(prompt) = lookup("RAGCHAT_SYSTEM_PROMPT") {
            self.system_prompt = prompt;
        }
        if let Some(raw) = lookup("RAGCHAT_MEMORY_LIMIT") {
            self.conversation_memory_limit = parse_env("RAGCHAT_MEMORY_LIMIT", &raw)?;
        }
        if let Some(raw) = lookup("RAGCHAT_RAG_ENABLED") {
            self.rag.enabled = parse_env("RAGCHAT_RAG_ENABLED", &raw)?;
        }
        if let Some(path) = lookup("RAGCHAT_KNOWLEDGE_FILE") {
            self.rag.knowledge_file = PathBuf::from(path);
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ragchat")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ollama_base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "ollama_base_url must not be empty".into(),
            ));
        }

        if self.model_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model_name must not be empty".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 1.0".into(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "max_tokens must be greater than 0".into(),
            ));
        }

        if self.conversation_memory_limit == 0 {
            return Err(ConfigError::ValidationError(
                "conversation_memory_limit must be greater than 0".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.rag.max_results == 0 {
            return Err(ConfigError::ValidationError(
                "rag.max_results must be greater than 0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.rag.min_relevance) {
            return Err(ConfigError::ValidationError(
                "rag.min_relevance must be between 0.0 and 1.0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        Self::default().to_toml()
    }

    /// Render this configuration as TOML.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            ollama_base_url: default_ollama_base_url(),
            model_name: default_model_name(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            system_prompt: default_system_prompt(),
            conversation_memory_limit: default_memory_limit(),
            request_timeout_secs: default_request_timeout_secs(),
            rag: RagConfig::default(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid value for environment variable {key}: {value:?}")]
    InvalidEnv { key: String, value: String },
}
