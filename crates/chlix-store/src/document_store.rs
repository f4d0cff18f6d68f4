use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::error::StoreError;

/// Flat metadata attached to a stored document.
pub type Metadata = HashMap<String, serde_json::Value>;

/// One document submitted for upsert. Identical `id`s overwrite.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
}

/// A document as returned by an exact (non-ranked) lookup.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
}

/// A document returned by a similarity query.
#[derive(Debug, Clone)]
pub struct QueryHit {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
    /// Cosine distance to the query (`1 - similarity`), when the backend reports one.
    pub distance: Option<f32>,
}

/// Exact-match conjunction over metadata fields.
#[derive(Debug, Clone, Default)]
pub struct MetadataFilter {
    pub must: Vec<FieldCondition>,
}

#[derive(Debug, Clone)]
pub struct FieldCondition {
    pub field: String,
    pub value: FieldValue,
}

#[derive(Debug, Clone)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
}

impl MetadataFilter {
    /// Filter matching documents whose `field` equals the string `value`.
    #[must_use]
    pub fn text(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            must: vec![FieldCondition {
                field: field.into(),
                value: FieldValue::Text(value.into()),
            }],
        }
    }

    /// Check whether a metadata map satisfies every condition.
    #[must_use]
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.must.iter().all(|cond| {
            metadata
                .get(&cond.field)
                .is_some_and(|val| match &cond.value {
                    FieldValue::Integer(i) => val.as_i64() == Some(*i),
                    FieldValue::Text(s) => val.as_str() == Some(s.as_str()),
                })
        })
    }
}

/// Summary of one collection.
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub name: String,
    pub count: u64,
    pub sample_metadata: Option<Metadata>,
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Text-in, text-out document store with server-side embedding.
///
/// Collections are isolated namespaces, typically one per indexed repository.
pub trait DocumentStore: Send + Sync {
    /// Create the collection if it does not exist yet. Idempotent.
    fn get_or_create_collection(&self, collection: &str)
    -> BoxFuture<'_, Result<(), StoreError>>;

    /// Upsert a batch of documents. A repeated id replaces the earlier document.
    fn add_documents(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Up to `limit` documents closest to `text`, closest first.
    fn query(
        &self,
        collection: &str,
        text: &str,
        limit: u64,
        filter: Option<MetadataFilter>,
    ) -> BoxFuture<'_, Result<Vec<QueryHit>, StoreError>>;

    /// Every document matching `filter`, in no particular order.
    fn get_documents(
        &self,
        collection: &str,
        filter: MetadataFilter,
    ) -> BoxFuture<'_, Result<Vec<StoredDocument>, StoreError>>;

    fn count(&self, collection: &str) -> BoxFuture<'_, Result<u64, StoreError>>;

    /// Names and document counts of every collection.
    fn list_collections(&self) -> BoxFuture<'_, Result<Vec<(String, u64)>, StoreError>>;

    fn collection_info(&self, collection: &str)
    -> BoxFuture<'_, Result<CollectionInfo, StoreError>>;

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), StoreError>>;
}
