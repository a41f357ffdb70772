//! Conversation memory for ragchat.

pub mod conversation;

pub use conversation::{ConversationMemory, MemorySummary};
