//! # ragchat core
//!
//! Domain types, traits, and error definitions for the ragchat assistant.
//! This crate has **no framework dependencies** — it defines the domain model
//! that the memory, knowledge, provider, and agent crates implement against.
//!
//! ## Design Philosophy
//!
//! The generation backend is a trait here; the Ollama client lives in
//! `ragchat-providers`. Tests swap in scripted providers without touching the
//! network.

pub mod error;
pub mod knowledge;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{Error, KnowledgeError, ProviderError, Result};
pub use knowledge::{KnowledgeEntry, KnowledgeStats, RetrievalResult};
pub use message::{Message, Role};
pub use provider::{GenerationRequest, Provider};
