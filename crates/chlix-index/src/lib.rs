//! Code indexing and semantic retrieval over a document store.
//!
//! Indexing walks a project tree, keeps files with known source extensions,
//! splits them into line-aligned chunks with position-derived ids and
//! upserts them into a [`chlix_store::DocumentStore`]. Retrieval runs
//! similarity queries against the same store and packs the ranked hits into
//! a token-budgeted context block.

pub mod chunker;
pub(crate) mod context;
pub mod error;
pub mod identity;
pub mod indexer;
pub mod retriever;
pub mod selector;

pub use chunker::ChunkerConfig;
pub use error::{IndexError, Result};
pub use indexer::{CodeIndexer, IndexReport, IndexerConfig, collection_name_for};
pub use retriever::{CodeRetriever, ContextWindow, FileChunk, SearchResult};
