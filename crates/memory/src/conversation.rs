//! Bounded conversation memory — a capped, ordered log of chat turns.
//!
//! Capacity is two slots per configured pair (one user turn, one assistant
//! turn). Appending past capacity silently evicts the oldest messages,
//! including the system message when the limit is small enough to reach it.

use std::collections::VecDeque;

use ragchat_core::message::{Message, Role};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ── Data Structures ───────────────────────────────────────────────────────

/// Ring-buffer of the most recent messages.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    pair_limit: usize,
    messages: VecDeque<Message>,
}

/// Per-role counts over the messages currently retained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySummary {
    pub total: usize,
    pub user: usize,
    pub assistant: usize,
    pub system: usize,
}

/// Upper bound on slots reserved up front; the buffer grows past it on demand.
const INITIAL_SLOTS: usize = 64;

// ── Implementation ────────────────────────────────────────────────────────

impl ConversationMemory {
    /// Create an empty memory holding at most `pair_limit` user/assistant pairs.
    pub fn new(pair_limit: usize) -> Self {
        info!(limit = pair_limit, "Initialized conversation memory");
        Self {
            pair_limit,
            messages: VecDeque::with_capacity(pair_limit.saturating_mul(2).min(INITIAL_SLOTS)),
        }
    }

    pub fn pair_limit(&self) -> usize {
        self.pair_limit
    }

    /// Maximum number of retained messages.
    pub fn capacity(&self) -> usize {
        self.pair_limit.saturating_mul(2)
    }

    // ── Recording ──

    /// Append a message, evicting from the front while over capacity.
    pub fn add(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push_back(Message::new(role, content));
        while self.messages.len() > self.capacity() {
            if let Some(evicted) = self.messages.pop_front() {
                debug!(role = %evicted.role, "Evicted oldest message from memory");
            }
        }
        debug!(role = %role, len = self.messages.len(), "Added message to memory");
    }

    pub fn add_user(&mut self, content: impl Into<String>) {
        self.add(Role::User, content);
    }

    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.add(Role::Assistant, content);
    }

    pub fn add_system(&mut self, content: impl Into<String>) {
        self.add(Role::System, content);
    }

    // ── Reading ──

    /// All retained messages, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// The last `count` messages (all when `None`), oldest first.
    pub fn recent(&self, count: Option<usize>) -> Vec<Message> {
        let skip = match count {
            Some(n) => self.messages.len().saturating_sub(n),
            None => 0,
        };
        self.messages.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    // ── Rendering ──

    /// Render as `"<Role>: <content>"` lines for an LLM prompt.
    pub fn format_for_prompt(&self, include_system: bool) -> String {
        self.messages
            .iter()
            .filter(|m| include_system || m.role != Role::System)
            .map(Message::prompt_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render as `"You: ..."` / `"Bot: ..."` lines for a human reader.
    /// System messages are skipped.
    pub fn format_for_display(&self) -> String {
        self.messages
            .iter()
            .filter_map(|m| {
                m.role
                    .display_label()
                    .map(|label| format!("{label}: {}", m.content))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ── Lifecycle ──

    pub fn clear(&mut self) {
        self.messages.clear();
        info!("Cleared conversation memory");
    }

    /// Counts reflect only what survived eviction, not lifetime totals.
    pub fn summary(&self) -> MemorySummary {
        self.messages
            .iter()
            .fold(MemorySummary::default(), |mut acc, m| {
                acc.total += 1;
                match m.role {
                    Role::User => acc.user += 1,
                    Role::Assistant => acc.assistant += 1,
                    Role::System => acc.system += 1,
                }
                acc
            })
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(memory: &ConversationMemory) -> Vec<String> {
        memory.messages().map(|m| m.content.clone()).collect()
    }

    #[test]
    fn starts_empty() {
        let memory = ConversationMemory::new(5);
        assert!(memory.is_empty());
        assert_eq!(memory.capacity(), 10);
        assert_eq!(memory.format_for_prompt(true), "");
    }

    #[test]
    fn keeps_last_pairs_in_order() {
        let mut memory = ConversationMemory::new(2);
        for i in 1..=6 {
            memory.add_user(format!("user {i}"));
            memory.add_assistant(format!("assistant {i}"));
        }

        assert_eq!(memory.len(), 4);
        assert_eq!(
            contents(&memory),
            ["user 5", "assistant 5", "user 6", "assistant 6"]
        );
    }

    #[test]
    fn retains_exactly_the_most_recent_messages_for_any_limit() {
        for limit in 1..=6 {
            let mut memory = ConversationMemory::new(limit);
            let total = limit * 2 + 7;
            for i in 0..total {
                memory.add_user(i.to_string());
            }
            let expected: Vec<String> = (total - limit * 2..total).map(|i| i.to_string()).collect();
            assert_eq!(memory.len(), limit * 2);
            assert_eq!(contents(&memory), expected);
        }
    }

    #[test]
    fn small_limit_evicts_system_prompt() {
        let mut memory = ConversationMemory::new(1);
        memory.add_system("Be helpful");
        memory.add_user("Hi");
        assert_eq!(memory.summary().system, 1);

        memory.add_assistant("Hello!");
        let summary = memory.summary();
        assert_eq!(summary.system, 0);
        assert_eq!(summary.total, 2);
    }

    #[test]
    fn recent_returns_tail() {
        let mut memory = ConversationMemory::new(5);
        memory.add_user("one");
        memory.add_assistant("two");
        memory.add_user("three");

        let last_two: Vec<String> = memory.recent(Some(2)).into_iter().map(|m| m.content).collect();
        assert_eq!(last_two, ["two", "three"]);
        assert_eq!(memory.recent(None).len(), 3);
        assert_eq!(memory.recent(Some(10)).len(), 3);
        assert!(memory.recent(Some(0)).is_empty());
        // Non-destructive
        assert_eq!(memory.len(), 3);
    }

    #[test]
    fn prompt_format_optionally_skips_system() {
        let mut memory = ConversationMemory::new(5);
        memory.add_system("You are helpful.");
        memory.add_user("Hello");
        memory.add_assistant("Hi there!");

        assert_eq!(
            memory.format_for_prompt(true),
            "System: You are helpful.\nUser: Hello\nAssistant: Hi there!"
        );
        assert_eq!(
            memory.format_for_prompt(false),
            "User: Hello\nAssistant: Hi there!"
        );
    }

    #[test]
    fn display_format_uses_friendly_labels() {
        let mut memory = ConversationMemory::new(5);
        memory.add_system("hidden");
        memory.add_user("Hello");
        memory.add_assistant("Hi there!");

        assert_eq!(memory.format_for_display(), "You: Hello\nBot: Hi there!");
    }

    #[test]
    fn summary_counts_roles() {
        let mut memory = ConversationMemory::new(5);
        memory.add_system("sys");
        memory.add_user("u1");
        memory.add_assistant("a1");
        memory.add_user("u2");

        assert_eq!(
            memory.summary(),
            MemorySummary { total: 4, user: 2, assistant: 1, system: 1 }
        );
    }

    #[test]
    fn clear_drops_everything() {
        let mut memory = ConversationMemory::new(3);
        memory.add_user("Hello");
        memory.add_assistant("Hi");
        memory.clear();

        assert!(memory.is_empty());
        assert_eq!(memory.summary(), MemorySummary::default());
    }

    #[test]
    fn huge_limit_does_not_preallocate() {
        let mut memory = ConversationMemory::new(1usize << 40);
        assert_eq!(memory.capacity(), 1usize << 41);

        memory.add_user("hi");
        memory.add_assistant("hello");
        assert_eq!(contents(&memory), ["hi", "hello"]);
    }

    #[test]
    fn max_limit_capacity_saturates() {
        let memory = ConversationMemory::new(usize::MAX);
        assert_eq!(memory.capacity(), usize::MAX);
    }
}
