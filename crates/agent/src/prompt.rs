//! Prompt assembly — turns memory, retrieved knowledge, and the new user
//! turn into the single string handed to the generation backend.
//!
//! Layout (each present part on its own line block, newline-joined):
//!
//! ```text
//! System: <system prompt>          ┐
//! User: <earlier turn>             │ history, if any
//! Assistant: <earlier reply>       ┘
//! [RAG CONTEXT - Relevant information:]   ┐
//! 1. <content> (<category>)               │ context block, if any results
//! [END RAG CONTEXT]                       ┘
//! User: <new input>
//! Assistant:
//! ```
//!
//! Retrieved context sits after history so it is closest to the generation cue.

use ragchat_core::knowledge::RetrievalResult;
use ragchat_knowledge::{KnowledgeStore, SearchOptions};
use ragchat_memory::ConversationMemory;
use tracing::debug;

/// First line of the context block.
pub const CONTEXT_OPEN: &str = "[RAG CONTEXT - Relevant information:]";

/// Last line of the context block.
pub const CONTEXT_CLOSE: &str = "[END RAG CONTEXT]";

/// Role prefixes the backend sometimes echoes back, lowercase.
const ROLE_PREFIXES: &[&str] = &["assistant:", "ai:", "bot:"];

/// Render retrieval results as a delimited, numbered context block.
/// Empty input renders as an empty string.
pub fn format_context(results: &[RetrievalResult]) -> String {
    if results.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(results.len() + 2);
    lines.push(CONTEXT_OPEN.to_string());
    for (i, result) in results.iter().enumerate() {
        match &result.category {
            Some(category) => lines.push(format!("{}. {} ({})", i + 1, result.content, category)),
            None => lines.push(format!("{}. {}", i + 1, result.content)),
        }
    }
    lines.push(CONTEXT_CLOSE.to_string());
    lines.join("\n")
}

/// Trim the raw backend output and drop a leaked leading role prefix
/// (`Assistant:`, `AI:`, `Bot:`, any case) with the whitespace after it.
///
/// This goes further than stripping a single prefix: stacked prefixes
/// (`Assistant: AI: hi`) are all removed, so `clean_response` is idempotent.
pub fn clean_response(raw: &str) -> String {
    let mut cleaned = raw.trim();
    while let Some(rest) = strip_role_prefix(cleaned) {
        cleaned = rest.trim_start();
    }
    cleaned.to_string()
}

fn strip_role_prefix(text: &str) -> Option<&str> {
    ROLE_PREFIXES.iter().find_map(|prefix| {
        text.get(..prefix.len())
            .filter(|head| head.eq_ignore_ascii_case(prefix))
            .map(|_| &text[prefix.len()..])
    })
}

/// Composes prompts for a session.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    options: SearchOptions,
}

impl PromptAssembler {
    pub fn new(options: SearchOptions) -> Self {
        Self { options }
    }

    /// Knowledge entries to inject for `user_input`.
    pub fn retrieve(&self, user_input: &str, knowledge: &KnowledgeStore) -> Vec<RetrievalResult> {
        let results = knowledge.search(user_input, self.options);
        if results.is_empty() {
            debug!("No relevant knowledge found for query");
        } else {
            debug!(count = results.len(), "Found relevant knowledge entries");
        }
        results
    }

    /// Build the exact prompt string for the backend.
    ///
    /// `memory` is rendered as-is; callers record the user message first.
    pub fn build_prompt(
        &self,
        user_input: &str,
        memory: &ConversationMemory,
        knowledge: &KnowledgeStore,
    ) -> String {
        let history = memory.format_for_prompt(true);
        let context = format_context(&self.retrieve(user_input, knowledge));

        let mut parts: Vec<String> = Vec::with_capacity(4);
        if !history.is_empty() {
            parts.push(history);
        }
        if !context.is_empty() {
            parts.push(context);
        }
        parts.push(format!("User: {user_input}"));
        parts.push("Assistant:".to_string());

        parts.join("\n")
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(SearchOptions::default())
    }
}
