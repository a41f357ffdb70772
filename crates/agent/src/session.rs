//! Chat session — owns memory, knowledge, and the backend handle, and
//! drives one conversational turn at a time.

use std::sync::Arc;

use ragchat_config::ChatConfig;
use ragchat_core::error::{Error, ProviderError, Result};
use ragchat_core::knowledge::{KnowledgeStats, RetrievalResult};
use ragchat_core::message::Role;
use ragchat_core::provider::{GenerationRequest, Provider};
use ragchat_knowledge::{KnowledgeStore, SearchOptions};
use ragchat_memory::ConversationMemory;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::prompt::{PromptAssembler, clean_response};

/// Reply to blank input. The backend is not called.
pub const EMPTY_INPUT_REPLY: &str = "I didn't receive any input. Could you please say something?";

/// Shown by `history(true)` when nothing but the system prompt is stored.
pub const NO_HISTORY: &str = "No conversation history yet.";

/// Where the conversation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// At least one turn is in memory.
    Active,
    /// Memory holds at most the system message.
    Reset,
}

/// Snapshot of session counters for `/stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationStats {
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub system_messages: usize,
    pub rag_enabled: bool,
    pub knowledge_entries: usize,
    pub knowledge_categories: usize,
}

/// A single user's conversation with the generation backend.
pub struct ChatSession {
    config: ChatConfig,
    provider: Arc<dyn Provider>,
    memory: ConversationMemory,
    knowledge: KnowledgeStore,
    assembler: PromptAssembler,
}

impl ChatSession {
    /// Validate `config`, set up knowledge, and seed the system prompt.
    ///
    /// Knowledge problems never fail construction; the session just runs
    /// without retrieval.
    pub fn new(config: ChatConfig, provider: Arc<dyn Provider>) -> Result<Self> {
        config.validate().map_err(|e| Error::Config {
            message: e.to_string(),
        })?;

        let knowledge = init_knowledge(&config);
        let assembler = PromptAssembler::new(SearchOptions::new(
            config.rag.max_results,
            config.rag.min_relevance,
        ));
        let memory = ConversationMemory::new(config.conversation_memory_limit);

        let mut session = Self {
            config,
            provider,
            memory,
            knowledge,
            assembler,
        };
        session.seed_system_prompt();

        info!(
            provider = session.provider.name(),
            model = %session.config.model_name,
            rag = session.knowledge.is_enabled(),
            "Chat session ready"
        );
        Ok(session)
    }

    fn seed_system_prompt(&mut self) {
        if !self.config.system_prompt.is_empty() {
            self.memory.add_system(self.config.system_prompt.clone());
        }
    }

    /// Run one turn and return the text to show the user.
    ///
    /// Never fails: backend errors come back as an apology and no
    /// assistant message is recorded for them.
    pub async fn turn(&mut self, input: &str) -> String {
        if input.trim().is_empty() {
            return EMPTY_INPUT_REPLY.to_string();
        }

        debug!(chars = input.len(), "Processing user input");
        self.memory.add_user(input);

        let prompt = self
            .assembler
            .build_prompt(input, &self.memory, &self.knowledge);

        let request = GenerationRequest::new(self.config.model_name.clone(), prompt)
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        match self.provider.generate(request).await {
            Ok(raw) => {
                let reply = clean_response(&raw);
                self.memory.add_assistant(reply.clone());
                debug!(chars = reply.len(), "Generated reply");
                reply
            }
            Err(e) => {
                log_provider_error(&e);
                format!("I'm sorry, I encountered an error: {e}")
            }
        }
    }

    /// Clear memory and re-seed the system prompt.
    pub fn reset(&mut self) {
        self.memory.clear();
        self.seed_system_prompt();
        info!("Conversation reset");
    }

    pub fn state(&self) -> SessionState {
        if self.memory.messages().all(|m| m.role == Role::System) {
            SessionState::Reset
        } else {
            SessionState::Active
        }
    }

    pub fn stats(&self) -> ConversationStats {
        let summary = self.memory.summary();
        let knowledge = self.knowledge.stats();
        ConversationStats {
            total_messages: summary.total,
            user_messages: summary.user,
            assistant_messages: summary.assistant,
            system_messages: summary.system,
            rag_enabled: self.knowledge.is_enabled(),
            knowledge_entries: knowledge.total_entries,
            knowledge_categories: knowledge.total_categories,
        }
    }

    /// Conversation so far. `formatted` gives display lines, otherwise the
    /// prompt rendering without the system message.
    pub fn history(&self, formatted: bool) -> String {
        if !formatted {
            return self.memory.format_for_prompt(false);
        }
        let display = self.memory.format_for_display();
        if display.is_empty() {
            NO_HISTORY.to_string()
        } else {
            display
        }
    }

    /// Manual knowledge search with the looser interactive thresholds.
    pub fn search(&self, query: &str) -> Vec<RetrievalResult> {
        self.knowledge.search(query, SearchOptions::manual())
    }

    pub fn knowledge_stats(&self) -> KnowledgeStats {
        self.knowledge.stats()
    }

    pub fn categories(&self) -> Vec<String> {
        self.knowledge.categories()
    }

    /// Re-read the knowledge file. On failure the old entries stay active.
    pub fn reload_knowledge(&mut self) -> bool {
        match self.knowledge.reload() {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Knowledge reload failed, keeping previous entries");
                false
            }
        }
    }

    /// Check the backend with a trivial prompt.
    pub async fn healthy(&self) -> bool {
        self.provider.health_check().await
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn knowledge(&self) -> &KnowledgeStore {
        &self.knowledge
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }
}

fn init_knowledge(config: &ChatConfig) -> KnowledgeStore {
    let path = config.rag.knowledge_file.clone();
    if !config.rag.enabled {
        info!("Retrieval disabled by configuration");
        return KnowledgeStore::disabled(path);
    }

    if !path.exists() {
        if let Err(e) = KnowledgeStore::write_default(&path) {
            error!(error = %e, "Failed to create default knowledge file, retrieval disabled");
            return KnowledgeStore::disabled(path);
        }
    }

    match KnowledgeStore::open(&path) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Failed to load knowledge, retrieval disabled");
            KnowledgeStore::disabled(path)
        }
    }
}

fn log_provider_error(e: &ProviderError) {
    match e {
        ProviderError::ModelNotFound(_) => warn!(error = %e, "Configured model unavailable"),
        ProviderError::Connection(_) => error!(error = %e, "Generation backend request failed"),
    }
}
