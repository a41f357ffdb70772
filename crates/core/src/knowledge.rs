//! Knowledge domain types — entries loaded from the knowledge file and the
//! per-query retrieval results scored against them.

use serde::{Deserialize, Serialize};

/// A single knowledge entry.
///
/// The `id` is the entry's key in the knowledge file; the remaining fields
/// are the entry object's fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Unique key of this entry
    #[serde(skip)]
    pub id: String,

    /// Keywords that trigger this entry
    pub keywords: Vec<String>,

    /// The knowledge content injected into prompts
    pub content: String,

    /// Optional category for organization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Additional metadata, carried but never interpreted
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl KnowledgeEntry {
    pub fn new(id: impl Into<String>, keywords: &[&str], content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            content: content.into(),
            category: None,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// A knowledge entry matched against a query, with relevance information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// ID of the knowledge entry
    pub entry_id: String,

    /// The knowledge content
    pub content: String,

    /// Matched keywords / entry keywords, in `[0, 1]`
    pub relevance_score: f32,

    /// Keywords that matched the query, in the entry's keyword order
    pub matched_keywords: Vec<String>,

    /// Category of the knowledge entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Knowledge store statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeStats {
    pub enabled: bool,
    pub total_entries: usize,
    pub total_categories: usize,
    pub categories: Vec<String>,
    pub total_keywords: usize,
    pub knowledge_file: String,
}
