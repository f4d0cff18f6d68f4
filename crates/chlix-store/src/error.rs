//! Error types for chlix-store.

/// Errors raised by document stores and embedders.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store or the embedding service could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// The named collection does not exist.
    #[error("collection '{0}' not found")]
    CollectionNotFound(String),

    /// Embedding a text failed or returned nothing.
    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("upsert error: {0}")]
    Upsert(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether this error means the collection is missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CollectionNotFound(_))
    }

    /// Whether this error means a backend was unreachable.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Result type alias using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_names_collection() {
        let err = StoreError::CollectionNotFound("repo".into());
        assert_eq!(err.to_string(), "collection 'repo' not found");
        assert!(err.is_not_found());
        assert!(!err.is_connection());
    }

    #[test]
    fn connection_classification() {
        let err = StoreError::Connection("refused".into());
        assert!(err.is_connection());
        assert!(!err.is_not_found());
    }
}
