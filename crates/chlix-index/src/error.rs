//! Error types for chlix-index.

/// Errors that abort an indexing or retrieval operation.
///
/// Per-file problems during a directory walk are not errors at this level;
/// they are reported as [`crate::indexer::FileOutcome::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Document store or embedding backend error.
    #[error(transparent)]
    Store(#[from] chlix_store::StoreError),

    /// IO error reading source files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The indexing root is missing or not a directory.
    #[error("invalid index root {path}: {reason}")]
    InvalidRoot { path: String, reason: &'static str },
}

impl IndexError {
    /// Whether the underlying cause is a missing collection.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }

    /// Whether the underlying cause is an unreachable backend.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_connection())
    }
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
