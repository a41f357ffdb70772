//! JSON-backed knowledge store.
//!
//! The knowledge file maps entry ids to entry objects:
//!
//! ```json
//! {
//!   "welcome": {
//!     "keywords": ["hello", "hi"],
//!     "content": "Welcome!",
//!     "category": "general",
//!     "metadata": {}
//!   }
//! }
//! ```
//!
//! Entries keep file order. A load builds the complete [`KnowledgeTable`]
//! first and only then publishes it, so holders of a [`KnowledgeStore::snapshot`]
//! never see a half-loaded table.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ragchat_core::error::KnowledgeError;
use ragchat_core::knowledge::{KnowledgeEntry, KnowledgeStats, RetrievalResult};
use tracing::{debug, info, warn};

use crate::retriever::{self, SearchOptions};

/// An immutable, ordered set of knowledge entries.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeTable {
    entries: Vec<KnowledgeEntry>,
    index: HashMap<String, usize>,
}

impl KnowledgeTable {
    /// Build a table from entries. A repeated id replaces the earlier entry in place.
    pub fn from_entries(entries: impl IntoIterator<Item = KnowledgeEntry>) -> Self {
        let mut table = Self::default();
        for entry in entries {
            match table.index.get(&entry.id) {
                Some(&pos) => table.entries[pos] = entry,
                None => {
                    table.index.insert(entry.id.clone(), table.entries.len());
                    table.entries.push(entry);
                }
            }
        }
        table
    }

    /// Parse the contents of a knowledge file.
    pub fn parse(path: &Path, content: &str) -> Result<Self, KnowledgeError> {
        let format_err = |reason: String| KnowledgeError::Format {
            path: path.to_path_buf(),
            reason,
        };

        let raw: serde_json::Value =
            serde_json::from_str(content).map_err(|e| format_err(format!("invalid JSON: {e}")))?;
        let serde_json::Value::Object(map) = raw else {
            return Err(format_err("expected a JSON object of entries".into()));
        };

        let mut entries = Vec::with_capacity(map.len());
        for (id, value) in map {
            let mut entry: KnowledgeEntry = serde_json::from_value(value)
                .map_err(|e| format_err(format!("entry '{id}': {e}")))?;
            entry.id = id;
            entries.push(entry);
        }

        Ok(Self::from_entries(entries))
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&KnowledgeEntry> {
        self.index.get(id).map(|&pos| &self.entries[pos])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted, de-duplicated categories. Entries without one are skipped.
    pub fn categories(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| e.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn total_keywords(&self) -> usize {
        self.entries.iter().map(|e| e.keywords.len()).sum()
    }
}

/// The knowledge store used by a session.
///
/// A disabled store holds no entries and never touches the file.
#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    path: PathBuf,
    enabled: bool,
    table: Arc<KnowledgeTable>,
}

impl KnowledgeStore {
    /// Open an enabled store and load `path` immediately.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, KnowledgeError> {
        let mut store = Self {
            path: path.into(),
            enabled: true,
            table: Arc::new(KnowledgeTable::default()),
        };
        store.load()?;
        Ok(store)
    }

    /// A store that answers every read with an empty result.
    pub fn disabled(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            enabled: false,
            table: Arc::new(KnowledgeTable::default()),
        }
    }

    /// Read the knowledge file and replace the whole table.
    ///
    /// On error the previously published table stays in place.
    pub fn load(&mut self) -> Result<(), KnowledgeError> {
        let table = read_table(&self.path)?;
        info!(entries = table.len(), path = %self.path.display(), "Loaded knowledge entries");
        self.table = Arc::new(table);
        Ok(())
    }

    /// Re-read the same file. No-op when disabled.
    pub fn reload(&mut self) -> Result<(), KnowledgeError> {
        if !self.enabled {
            debug!("Knowledge store disabled, skipping reload");
            return Ok(());
        }
        self.load()?;
        info!("Knowledge base reloaded");
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The currently published table.
    pub fn snapshot(&self) -> Arc<KnowledgeTable> {
        Arc::clone(&self.table)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<KnowledgeEntry> {
        self.table.get(id).cloned()
    }

    /// A copy of every entry, in file order.
    pub fn all(&self) -> Vec<KnowledgeEntry> {
        self.table.entries().to_vec()
    }

    pub fn categories(&self) -> Vec<String> {
        self.table.categories()
    }

    /// Entries whose category equals `category`, ignoring case.
    pub fn by_category(&self, category: &str) -> Vec<KnowledgeEntry> {
        let wanted = category.to_lowercase();
        self.table
            .entries()
            .iter()
            .filter(|e| e.category.as_ref().is_some_and(|c| c.to_lowercase() == wanted))
            .cloned()
            .collect()
    }

    /// Best-effort keyword search. Never fails; internal errors yield no results.
    pub fn search(&self, query: &str, options: SearchOptions) -> Vec<RetrievalResult> {
        if !self.enabled || query.trim().is_empty() {
            return Vec::new();
        }

        best_effort(retriever::rank(self.table.entries(), query, options))
    }

    pub fn stats(&self) -> KnowledgeStats {
        if !self.enabled {
            return KnowledgeStats::default();
        }

        let categories = self.categories();
        KnowledgeStats {
            enabled: true,
            total_entries: self.table.len(),
            total_categories: categories.len(),
            categories,
            total_keywords: self.table.total_keywords(),
            knowledge_file: self.path.display().to_string(),
        }
    }

    /// Write the starter knowledge file, creating parent directories.
    pub fn write_default(path: &Path) -> Result<(), KnowledgeError> {
        let io_err = |source| KnowledgeError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let default_knowledge = serde_json::json!({
            "welcome": {
                "keywords": ["hello", "hi", "welcome", "start"],
                "content": "Welcome to the RAG chatbot! I can help you with questions about programming, AI and technology.",
                "category": "general"
            }
        });
        let body = serde_json::to_string_pretty(&default_knowledge).map_err(|e| {
            KnowledgeError::Format {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        std::fs::write(path, body).map_err(io_err)?;
        info!(path = %path.display(), "Created default knowledge file");
        Ok(())
    }
}

/// Retrieval never fails the caller; a ranking error means no context.
fn best_effort(ranked: Result<Vec<RetrievalResult>, KnowledgeError>) -> Vec<RetrievalResult> {
    match ranked {
        Ok(results) => {
            debug!(found = results.len(), "Knowledge search complete");
            results
        }
        Err(e) => {
            warn!(error = %e, "Error during knowledge search");
            Vec::new()
        }
    }
}

fn read_table(path: &Path) -> Result<KnowledgeTable, KnowledgeError> {
    if !path.exists() {
        return Err(KnowledgeError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let bytes = std::fs::read(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => KnowledgeError::NotFound {
            path: path.to_path_buf(),
        },
        _ => KnowledgeError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let content = String::from_utf8(bytes).map_err(|e| KnowledgeError::Format {
        path: path.to_path_buf(),
        reason: format!("invalid UTF-8: {e}"),
    })?;

    KnowledgeTable::parse(path, &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "python_basics": {
            "keywords": ["python", "programming", "language", "code"],
            "content": "Python is a high-level programming language.",
            "category": "programming"
        },
        "machine_learning": {
            "keywords": ["machine", "learning", "artificial", "intelligence"],
            "content": "Machine learning is a subset of AI.",
            "category": "Technology",
            "metadata": {"source": "handbook", "difficulty": "beginner"}
        },
        "ollama": {
            "keywords": ["ollama", "local", "models"],
            "content": "Ollama runs language models locally."
        }
    }"#;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    fn sample_store() -> (tempfile::TempDir, KnowledgeStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "knowledge.json", SAMPLE);
        let store = KnowledgeStore::open(path).unwrap();
        (dir, store)
    }

    #[test]
    fn loads_entries_in_file_order() {
        let (_dir, store) = sample_store();
        assert!(store.is_enabled());
        assert_eq!(store.len(), 3);

        let ids: Vec<String> = store.all().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, ["python_basics", "machine_learning", "ollama"]);

        let ml = store.get("machine_learning").unwrap();
        assert_eq!(ml.metadata["source"], "handbook");
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = KnowledgeStore::open("/nonexistent/knowledge.json").unwrap_err();
        assert!(matches!(err, KnowledgeError::NotFound { .. }));
    }

    #[test]
    fn invalid_json_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "bad.json", "{ not json");
        let err = KnowledgeStore::open(path).unwrap_err();
        assert!(matches!(err, KnowledgeError::Format { .. }));
    }

    #[test]
    fn non_utf8_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.json");
        std::fs::write(&path, [b'{', 0xff, 0xfe, b'}']).unwrap();

        match KnowledgeStore::open(path).unwrap_err() {
            KnowledgeError::Format { reason, .. } => assert!(reason.contains("UTF-8")),
            other => panic!("expected Format, got {other:?}"),
        }
    }

    #[test]
    fn ranking_error_degrades_to_empty() {
        let failed = Err(KnowledgeError::Scoring {
            entry_id: "broken".into(),
            reason: "relevance score NaN outside [0, 1]".into(),
        });
        assert!(best_effort(failed).is_empty());

        let ok = Ok(vec![RetrievalResult {
            entry_id: "a".into(),
            content: "A".into(),
            relevance_score: 1.0,
            matched_keywords: vec!["a".into()],
            category: None,
        }]);
        assert_eq!(best_effort(ok).len(), 1);
    }

    #[test]
    fn non_object_root_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "list.json", r#"["a", "b"]"#);
        let err = KnowledgeStore::open(path).unwrap_err();
        assert!(matches!(err, KnowledgeError::Format { .. }));
    }

    #[test]
    fn missing_required_field_names_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "partial.json", r#"{"broken": {"keywords": ["x"]}}"#);
        let err = KnowledgeStore::open(path).unwrap_err();
        match err {
            KnowledgeError::Format { reason, .. } => {
                assert!(reason.contains("broken"));
                assert!(reason.contains("content"));
            }
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn disabled_store_never_reads_and_returns_nothing() {
        let mut store = KnowledgeStore::disabled("/nonexistent/knowledge.json");
        assert!(!store.is_enabled());
        assert!(store.is_empty());
        assert!(store.all().is_empty());
        assert!(store.categories().is_empty());
        assert!(store.search("python", SearchOptions::manual()).is_empty());
        assert!(store.reload().is_ok());
        assert_eq!(store.stats(), KnowledgeStats::default());
    }

    #[test]
    fn all_returns_a_defensive_copy() {
        let (_dir, store) = sample_store();
        let mut copy = store.all();
        copy.clear();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn categories_sorted_and_deduplicated() {
        let (_dir, store) = sample_store();
        assert_eq!(store.categories(), ["Technology", "programming"]);
    }

    #[test]
    fn by_category_ignores_case() {
        let (_dir, store) = sample_store();
        let tech = store.by_category("technology");
        assert_eq!(tech.len(), 1);
        assert_eq!(tech[0].id, "machine_learning");
        assert!(store.by_category("nonexistent").is_empty());
    }

    #[test]
    fn search_blank_query_is_empty() {
        let (_dir, store) = sample_store();
        assert!(store.search("", SearchOptions::manual()).is_empty());
        assert!(store.search("   \t", SearchOptions::manual()).is_empty());
    }

    #[test]
    fn search_ranks_entries() {
        let (_dir, store) = sample_store();
        let results = store.search("Tell me about ollama local models", SearchOptions::default());
        assert_eq!(results[0].entry_id, "ollama");
        assert!((results[0].relevance_score - 1.0).abs() < f32::EPSILON);
        assert!(results[0].category.is_none());
    }

    #[test]
    fn reload_reflects_on_disk_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "knowledge.json", SAMPLE);
        let mut store = KnowledgeStore::open(&path).unwrap();
        assert_eq!(store.len(), 3);

        std::fs::write(
            &path,
            r#"{"only": {"keywords": ["fresh"], "content": "Fresh content", "category": "new"}}"#,
        )
        .unwrap();
        store.reload().unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("only").unwrap().content, "Fresh content");
        assert!(store.get("python_basics").is_none());
    }

    #[test]
    fn failed_reload_keeps_previous_table_and_snapshots_are_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "knowledge.json", SAMPLE);
        let mut store = KnowledgeStore::open(&path).unwrap();
        let before = store.snapshot();

        std::fs::write(&path, "{ broken").unwrap();
        assert!(store.reload().is_err());
        assert_eq!(store.len(), 3);

        std::fs::write(&path, r#"{"a": {"keywords": ["a"], "content": "A"}}"#).unwrap();
        store.reload().unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(before.len(), 3);
    }

    #[test]
    fn stats_summarize_table() {
        let (_dir, store) = sample_store();
        let stats = store.stats();
        assert!(stats.enabled);
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.total_categories, 2);
        assert_eq!(stats.total_keywords, 11);
        assert!(stats.knowledge_file.ends_with("knowledge.json"));
    }

    #[test]
    fn write_default_creates_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data").join("knowledge.json");
        KnowledgeStore::write_default(&path).unwrap();

        let store = KnowledgeStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        let welcome = store.get("welcome").unwrap();
        assert_eq!(welcome.category.as_deref(), Some("general"));
        assert_eq!(store.search("hello there", SearchOptions::default()).len(), 1);
    }

    #[test]
    fn repeated_ids_replace_in_place() {
        let table = KnowledgeTable::from_entries(vec![
            KnowledgeEntry::new("a", &["one"], "first"),
            KnowledgeEntry::new("b", &["two"], "second"),
            KnowledgeEntry::new("a", &["three"], "replaced"),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.entries()[0].content, "replaced");
    }
}
