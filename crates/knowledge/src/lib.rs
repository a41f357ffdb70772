//! Knowledge store and keyword retriever for ragchat.
//!
//! The store loads a JSON file mapping entry ids to entries once, keeps it
//! in memory, and swaps the whole table on reload. The retriever ranks
//! entries by keyword overlap with free-text queries.

pub mod retriever;
pub mod store;

pub use retriever::{SearchOptions, extract_keywords};
pub use store::{KnowledgeStore, KnowledgeTable};
