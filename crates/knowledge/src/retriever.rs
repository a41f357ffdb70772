//! Keyword-overlap relevance scoring.
//!
//! A query is reduced to a set of normalized tokens; each entry scores
//! `|query ∩ entry keywords| / |entry keywords|`. Normalizing by the entry's
//! keyword count (not the query's) favors small, precise entries over broad
//! ones. Entries with no overlap are never returned.

use std::collections::{BTreeSet, HashSet};

use ragchat_core::error::KnowledgeError;
use ragchat_core::knowledge::{KnowledgeEntry, RetrievalResult};

/// Characters stripped from both ends of every query word.
pub const STRIP_CHARS: &[char] = &['.', ',', '!', '?', ';', ':', '(', ')', '[', ']', '{', '}'];

/// Words of this many characters or fewer are ignored.
const MIN_WORD_CHARS: usize = 2;

/// Limits applied to a ranked result list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Truncate to this many results.
    pub max_results: usize,
    /// Drop results scoring below this.
    pub min_relevance: f32,
}

impl SearchOptions {
    pub fn new(max_results: usize, min_relevance: f32) -> Self {
        Self {
            max_results,
            min_relevance,
        }
    }

    /// Wider net for user-initiated searches.
    pub fn manual() -> Self {
        Self::new(10, 0.05)
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::new(3, 0.1)
    }
}

/// Normalize a free-text query into a set of lowercase tokens.
///
/// The length filter runs on the raw word, before punctuation is stripped.
pub fn extract_keywords(query: &str) -> BTreeSet<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() > MIN_WORD_CHARS)
        .map(|word| word.trim_matches(STRIP_CHARS))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// `matched / distinct`, rejected unless it lands in `[0, 1]`.
fn checked_score(entry_id: &str, matched: usize, distinct: usize) -> Result<f32, KnowledgeError> {
    let score = matched as f32 / distinct as f32;
    if !score.is_finite() || !(0.0..=1.0).contains(&score) {
        return Err(KnowledgeError::Scoring {
            entry_id: entry_id.to_string(),
            reason: format!("relevance score {score} outside [0, 1]"),
        });
    }
    Ok(score)
}

/// Score a single entry. Returns `None` when nothing overlaps.
fn score_entry(
    entry: &KnowledgeEntry,
    query_tokens: &BTreeSet<String>,
) -> Result<Option<RetrievalResult>, KnowledgeError> {
    let mut seen = HashSet::new();
    let mut matched = Vec::new();

    for keyword in &entry.keywords {
        let keyword = keyword.to_lowercase();
        if !seen.insert(keyword.clone()) {
            continue;
        }
        if query_tokens.contains(&keyword) {
            matched.push(keyword);
        }
    }

    if matched.is_empty() {
        return Ok(None);
    }

    let score = checked_score(&entry.id, matched.len(), seen.len())?;

    Ok(Some(RetrievalResult {
        entry_id: entry.id.clone(),
        content: entry.content.clone(),
        relevance_score: score,
        matched_keywords: matched,
        category: entry.category.clone(),
    }))
}

/// Rank `entries` against `query`.
///
/// Results are sorted by descending score; ties keep the order of `entries`.
pub fn rank<'a>(
    entries: impl IntoIterator<Item = &'a KnowledgeEntry>,
    query: &str,
    options: SearchOptions,
) -> Result<Vec<RetrievalResult>, KnowledgeError> {
    let query_tokens = extract_keywords(query);
    if query_tokens.is_empty() {
        return Ok(Vec::new());
    }

    let mut results = Vec::new();
    for entry in entries {
        if let Some(result) = score_entry(entry, &query_tokens)? {
            if result.relevance_score >= options.min_relevance {
                results.push(result);
            }
        }
    }

    // `sort_by` is stable, which keeps encounter order for equal scores.
    results.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    results.truncate(options.max_results);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample_entries() -> Vec<KnowledgeEntry> {
        vec![
            KnowledgeEntry::new(
                "python",
                &["python", "programming", "language", "code"],
                "Python is a high-level programming language.",
            )
            .with_category("programming"),
            KnowledgeEntry::new(
                "ai",
                &["artificial", "intelligence", "machine", "learning"],
                "AI is the simulation of human intelligence by machines.",
            )
            .with_category("technology"),
            KnowledgeEntry::new("rust", &["rust", "language"], "Rust is a systems language."),
        ]
    }

    #[test]
    fn extracts_normalized_tokens() {
        assert_eq!(
            extract_keywords("What is Python programming?"),
            tokens(&["what", "python", "programming"])
        );
    }

    #[test]
    fn short_words_are_dropped_before_stripping() {
        // "is" and "AI" are too short; "(x)" is 3 chars raw and survives as "x".
        assert_eq!(extract_keywords("is AI (x)"), tokens(&["x"]));
    }

    #[test]
    fn duplicates_collapse() {
        assert_eq!(extract_keywords("rust Rust RUST!"), tokens(&["rust"]));
    }

    #[test]
    fn punctuation_only_words_vanish() {
        assert!(extract_keywords("... !!! ???").is_empty());
    }

    #[test]
    fn scores_by_entry_keyword_count() {
        let entries = sample_entries();
        let results = rank(&entries, "Which language: rust or python?", SearchOptions::manual()).unwrap();

        assert_eq!(results.len(), 2);
        // rust: 2/2 matched; python: 2/4 matched
        assert_eq!(results[0].entry_id, "rust");
        assert!((results[0].relevance_score - 1.0).abs() < f32::EPSILON);
        assert_eq!(results[1].entry_id, "python");
        assert!((results[1].relevance_score - 0.5).abs() < f32::EPSILON);
        assert_eq!(results[1].matched_keywords, vec!["python", "language"]);
    }

    #[test]
    fn zero_overlap_never_returned() {
        let entries = sample_entries();
        let results = rank(&entries, "weather forecast tomorrow", SearchOptions::new(10, 0.0)).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn threshold_filters_low_scores() {
        let entries = sample_entries();
        let results = rank(&entries, "machine", SearchOptions::new(10, 0.5)).unwrap();
        assert!(results.is_empty());

        let results = rank(&entries, "machine", SearchOptions::new(10, 0.25)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry_id, "ai");
    }

    #[test]
    fn ties_keep_encounter_order_and_truncate() {
        let entries = vec![
            KnowledgeEntry::new("first", &["shared", "alpha"], "1"),
            KnowledgeEntry::new("second", &["shared", "beta"], "2"),
            KnowledgeEntry::new("third", &["shared", "gamma"], "3"),
        ];
        let results = rank(&entries, "shared", SearchOptions::new(2, 0.0)).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.entry_id.as_str()).collect();
        assert_eq!(ids, ["first", "second"]);
    }

    #[test]
    fn ordering_is_non_increasing_and_scores_bounded() {
        let entries = sample_entries();
        let results = rank(
            &entries,
            "python code language rust artificial machine learning intelligence",
            SearchOptions::manual(),
        )
        .unwrap();
        assert!(!results.is_empty());
        for pair in results.windows(2) {
            assert!(pair[0].relevance_score >= pair[1].relevance_score);
        }
        for r in &results {
            assert!((0.0..=1.0).contains(&r.relevance_score));
            assert!(!r.matched_keywords.is_empty());
        }
    }

    #[test]
    fn entry_keywords_match_case_insensitively() {
        let entries = vec![KnowledgeEntry::new("aris", &["Aris", "THORNE"], "Dr. Thorne")];
        let results = rank(&entries, "Who is aris thorne?", SearchOptions::default()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].matched_keywords, vec!["aris", "thorne"]);
    }

    #[test]
    fn impossible_scores_are_rejected() {
        assert_eq!(checked_score("ok", 1, 4).unwrap(), 0.25);
        assert!(matches!(
            checked_score("empty", 0, 0),
            Err(KnowledgeError::Scoring { entry_id, .. }) if entry_id == "empty"
        ));
        assert!(matches!(
            checked_score("over", 3, 2),
            Err(KnowledgeError::Scoring { .. })
        ));
    }
}
