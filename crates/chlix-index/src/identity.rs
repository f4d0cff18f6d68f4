//! Deterministic chunk identifiers.
//!
//! The id depends only on where a chunk sits, never on its content, so
//! re-indexing an unchanged layout overwrites existing documents in place.

/// Canonical key string for a chunk position.
#[must_use]
pub fn identity_key(file_path: &str, start_line: usize, end_line: usize) -> String {
    format!("{file_path}:{start_line}-{end_line}")
}

/// Identifier for the chunk at `file_path` spanning `start_line..=end_line`.
///
/// BLAKE3 of the canonical key, truncated to 128 bits and rendered as a
/// hyphenated UUID so stores that require UUID point ids accept it as-is.
#[must_use]
pub fn chunk_id(file_path: &str, start_line: usize, end_line: usize) -> String {
    let key = identity_key(file_path, start_line, end_line);
    let digest = blake3::hash(key.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest.as_bytes()[..16]);
    uuid::Uuid::from_bytes(bytes).hyphenated().to_string()
}
