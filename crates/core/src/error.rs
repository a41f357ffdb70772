//! Error types for the ragchat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all ragchat operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Knowledge errors ---
    #[error("Knowledge error: {0}")]
    Knowledge(#[from] KnowledgeError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the generation backend.
///
/// Both variants are surfaced to the user as an in-band apology by the
/// session; neither is ever recorded into conversation memory.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The backend could not be reached, or answered with an error.
    #[error("Could not connect to the generation backend: {0}")]
    Connection(String),

    /// The backend is reachable but the requested model is absent.
    #[error("{0}")]
    ModelNotFound(String),
}

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("Knowledge file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Invalid knowledge file {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    #[error("Failed to access knowledge file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scoring failed for entry '{entry_id}': {reason}")]
    Scoring { entry_id: String, reason: String },
}
