pub mod chat;
pub mod config_cmd;
pub mod doctor;
pub mod knowledge;
pub mod search;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use ragchat_agent::ChatSession;
use ragchat_config::{ChatConfig, LONG_RESPONSE_MAX_TOKENS};
use ragchat_core::knowledge::{KnowledgeStats, RetrievalResult};

/// Settings that override the config file and environment for one run.
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Path to a config file (default: ~/.ragchat/config.toml)
    #[arg(long, global = true, env = "RAGCHAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Model to generate with
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Sampling temperature (0.0 to 1.0)
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Maximum tokens per response
    #[arg(long, global = true)]
    pub max_tokens: Option<u32>,

    /// Base URL of the Ollama server
    #[arg(long, global = true)]
    pub ollama_url: Option<String>,

    /// Number of exchanges kept in memory
    #[arg(long, global = true)]
    pub memory_limit: Option<usize>,

    /// Allow long responses (4000 tokens)
    #[arg(long, global = true)]
    pub long_responses: bool,

    /// Disable knowledge retrieval
    #[arg(long, global = true)]
    pub no_rag: bool,

    /// Knowledge file to load
    #[arg(long, global = true)]
    pub knowledge_file: Option<PathBuf>,
}

impl Overrides {
    /// Config file, then environment, then these flags; validated.
    pub fn resolve(&self) -> Result<ChatConfig, Box<dyn std::error::Error>> {
        let mut config = ChatConfig::load_layered(&self.config_path())
            .map_err(|e| format!("Failed to load config: {e}"))?;

        self.apply(&mut config);
        config
            .validate()
            .map_err(|e| format!("Invalid settings: {e}"))?;
        Ok(config)
    }

    /// The config file this run reads.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| ChatConfig::config_dir().join("config.toml"))
    }

    pub fn apply(&self, config: &mut ChatConfig) {
        if let Some(model) = &self.model {
            config.model_name = model.clone();
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
        if self.long_responses {
            config.max_tokens = LONG_RESPONSE_MAX_TOKENS;
        }
        if let Some(url) = &self.ollama_url {
            config.ollama_base_url = url.clone();
        }
        if let Some(limit) = self.memory_limit {
            config.conversation_memory_limit = limit;
        }
        if self.no_rag {
            config.rag.enabled = false;
        }
        if let Some(path) = &self.knowledge_file {
            config.rag.knowledge_file = path.clone();
        }
    }
}

/// Build a session against the configured Ollama server.
pub fn build_session(config: ChatConfig) -> Result<ChatSession, Box<dyn std::error::Error>> {
    let provider = ragchat_providers::build_from_config(&config)?;
    Ok(ChatSession::new(config, Arc::new(provider))?)
}

pub fn print_results(query: &str, results: &[RetrievalResult]) {
    if results.is_empty() {
        println!("  No knowledge found for '{query}'");
        return;
    }

    println!("  Knowledge results for '{query}':");
    for (i, result) in results.iter().enumerate() {
        let category = result.category.as_deref().unwrap_or("uncategorized");
        println!();
        println!(
            "  {}. [{}] {} (score {:.2})",
            i + 1,
            result.entry_id,
            category,
            result.relevance_score
        );
        println!("     {}", result.content);
        println!("     matched: {}", result.matched_keywords.join(", "));
    }
}

pub fn print_knowledge_stats(stats: &KnowledgeStats) {
    if !stats.enabled {
        println!("  Knowledge retrieval is disabled");
        return;
    }

    println!("  File:        {}", stats.knowledge_file);
    println!("  Entries:     {}", stats.total_entries);
    println!("  Keywords:    {}", stats.total_keywords);
    println!("  Categories:  {}", stats.total_categories);
    if !stats.categories.is_empty() {
        println!("               {}", stats.categories.join(", "));
    }
}
