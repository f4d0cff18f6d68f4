//! Document storage and embedding backends for code chunks.
//!
//! The indexing core talks to a [`DocumentStore`]: text goes in, text comes
//! back out ranked by similarity. Embedding is the store's concern, handled
//! through an [`Embedder`]. Two stores are provided: [`QdrantDocumentStore`]
//! for real deployments and [`InMemoryDocumentStore`] for tests.

pub mod document_store;
pub mod embedding;
pub mod error;
pub mod in_memory_store;
pub mod ollama;
pub mod qdrant;

pub use document_store::{
    CollectionInfo, Document, DocumentStore, FieldCondition, FieldValue, Metadata,
    MetadataFilter, QueryHit, StoredDocument,
};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use embedding::Embedder;
pub use error::{Result, StoreError};
pub use in_memory_store::InMemoryDocumentStore;
pub use ollama::OllamaEmbedder;
pub use qdrant::QdrantDocumentStore;
