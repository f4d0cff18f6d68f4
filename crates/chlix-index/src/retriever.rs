//! Semantic search, budget-packed context assembly and per-file lookup.

use std::sync::Arc;

use chlix_store::{DocumentStore, Metadata, MetadataFilter};
use serde::Serialize;

use crate::context::{CONTEXT_PREAMBLE, estimate_tokens, format_context_block};
use crate::error::Result;

/// One ranked hit with its positional metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub content: String,
    pub file_path: String,
    pub start_line: usize,
    pub end_line: usize,
    pub file_type: String,
    /// `1 - distance`; `None` when the store reported no distance.
    pub relevance_score: Option<f32>,
}

/// Budget-bounded prefix of the ranked results, rendered as text.
#[derive(Debug, Clone, Serialize)]
pub struct ContextWindow {
    pub text: String,
    /// Results whose blocks made it into `text`, in rank order.
    pub entries: Vec<SearchResult>,
    /// Sum of the per-block estimates, never above the requested budget.
    /// The preamble is not counted, and re-estimating `text` as a whole can
    /// come out higher.
    pub estimated_tokens: usize,
}

/// A stored chunk of one file, for positional reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChunk {
    pub content: String,
    pub file_path: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// Read side of one indexed collection.
pub struct CodeRetriever {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl CodeRetriever {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Up to `limit` results in the store's similarity order, optionally
    /// restricted to one type tag (e.g. `.rs`).
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is missing or the query fails.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        file_type: Option<&str>,
    ) -> Result<Vec<SearchResult>> {
        let filter = file_type.map(|t| MetadataFilter::text("file_type", t));
        let limit = u64::try_from(limit).unwrap_or(u64::MAX);
        let hits = self
            .store
            .query(&self.collection, query, limit, filter)
            .await?;

        tracing::debug!(collection = %self.collection, query, hits = hits.len(), "search");

        Ok(hits
            .into_iter()
            .map(|hit| SearchResult {
                file_path: text_field(&hit.metadata, "file_path"),
                start_line: line_field(&hit.metadata, "start_line"),
                end_line: line_field(&hit.metadata, "end_line"),
                file_type: text_field(&hit.metadata, "file_type"),
                relevance_score: hit.distance.map(|d| 1.0 - d),
                content: hit.document,
            })
            .collect())
    }

    /// Search, then pack formatted blocks in rank order until the next one
    /// would push the estimated cost past `max_tokens`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying search fails.
    pub async fn assemble_context(
        &self,
        query: &str,
        limit: usize,
        max_tokens: usize,
    ) -> Result<ContextWindow> {
        let results = self.search(query, limit, None).await?;
        Ok(pack_context(results, max_tokens))
    }

    /// Every stored chunk of `file_path`, ordered by `start_line`.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is missing or the read fails.
    pub async fn search_by_file(&self, file_path: &str) -> Result<Vec<FileChunk>> {
        let docs = self
            .store
            .get_documents(&self.collection, MetadataFilter::text("file_path", file_path))
            .await?;

        let mut chunks: Vec<FileChunk> = docs
            .into_iter()
            .map(|doc| FileChunk {
                file_path: text_field(&doc.metadata, "file_path"),
                start_line: line_field(&doc.metadata, "start_line"),
                end_line: line_field(&doc.metadata, "end_line"),
                content: doc.document,
            })
            .collect();
        chunks.sort_by_key(|c| c.start_line);
        Ok(chunks)
    }
}

fn pack_context(results: Vec<SearchResult>, max_tokens: usize) -> ContextWindow {
    let mut text = String::from(CONTEXT_PREAMBLE);
    let mut entries = Vec::new();
    let mut used_tokens = 0;

    for result in results {
        let block = format_context_block(
            &result.file_path,
            result.start_line,
            result.end_line,
            &result.file_type,
            &result.content,
        );
        let cost = estimate_tokens(&block);
        if used_tokens + cost > max_tokens {
            break;
        }
        used_tokens += cost;
        text.push_str(&block);
        entries.push(result);
    }

    ContextWindow {
        text,
        entries,
        estimated_tokens: used_tokens,
    }
}

fn text_field(metadata: &Metadata, key: &str) -> String {
    metadata
        .get(key)
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn line_field(metadata: &Metadata, key: &str) -> usize {
    metadata
        .get(key)
        .and_then(serde_json::Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0)
}
