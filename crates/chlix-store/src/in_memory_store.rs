use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::document_store::{
    BoxFuture, CollectionInfo, Document, DocumentStore, Metadata, MetadataFilter, QueryHit,
    StoredDocument,
};
use crate::embedding::Embedder;
use crate::error::StoreError;

struct StoredPoint {
    vector: Vec<f32>,
    document: String,
    metadata: Metadata,
}

#[derive(Default)]
struct InMemoryCollection {
    points: HashMap<String, StoredPoint>,
}

/// Process-local [`DocumentStore`] with the same upsert and ranking contract as
/// the Qdrant store. Nothing is persisted.
pub struct InMemoryDocumentStore<E> {
    embedder: E,
    collections: RwLock<BTreeMap<String, InMemoryCollection>>,
}

impl<E: Embedder> InMemoryDocumentStore<E> {
    #[must_use]
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            collections: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<E> std::fmt::Debug for InMemoryDocumentStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .finish_non_exhaustive()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn poisoned(e: &impl std::fmt::Display) -> StoreError {
    StoreError::Connection(format!("in-memory store lock poisoned: {e}"))
}

impl<E: Embedder> DocumentStore for InMemoryDocumentStore<E> {
    fn get_or_create_collection(
        &self,
        collection: &str,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self.collections.write().map_err(|e| poisoned(&e))?;
            cols.entry(collection).or_default();
            Ok(())
        })
    }

    fn add_documents(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut embedded = Vec::with_capacity(documents.len());
            for doc in documents {
                let vector = self.embedder.embed(&doc.text).await?;
                embedded.push((doc, vector));
            }

            let mut cols = self.collections.write().map_err(|e| poisoned(&e))?;
            let col = cols
                .get_mut(&collection)
                .ok_or_else(|| StoreError::CollectionNotFound(collection.clone()))?;
            for (doc, vector) in embedded {
                col.points.insert(
                    doc.id,
                    StoredPoint {
                        vector,
                        document: doc.text,
                        metadata: doc.metadata,
                    },
                );
            }
            Ok(())
        })
    }

    fn query(
        &self,
        collection: &str,
        text: &str,
        limit: u64,
        filter: Option<MetadataFilter>,
    ) -> BoxFuture<'_, Result<Vec<QueryHit>, StoreError>> {
        let collection = collection.to_owned();
        let text = text.to_owned();
        Box::pin(async move {
            if !self.collections.read().map_err(|e| poisoned(&e))?.contains_key(&collection) {
                return Err(StoreError::CollectionNotFound(collection));
            }
            let vector = self.embedder.embed(&text).await?;

            let cols = self.collections.read().map_err(|e| poisoned(&e))?;
            let col = cols
                .get(&collection)
                .ok_or_else(|| StoreError::CollectionNotFound(collection.clone()))?;

            let filter = filter.unwrap_or_default();
            let mut hits: Vec<QueryHit> = col
                .points
                .iter()
                .filter(|(_, sp)| filter.matches(&sp.metadata))
                .map(|(id, sp)| QueryHit {
                    id: id.clone(),
                    document: sp.document.clone(),
                    metadata: sp.metadata.clone(),
                    distance: Some(1.0 - cosine_similarity(&vector, &sp.vector)),
                })
                .collect();

            hits.sort_by(|a, b| {
                a.distance
                    .partial_cmp(&b.distance)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            });
            hits.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            Ok(hits)
        })
    }

    fn get_documents(
        &self,
        collection: &str,
        filter: MetadataFilter,
    ) -> BoxFuture<'_, Result<Vec<StoredDocument>, StoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self.collections.read().map_err(|e| poisoned(&e))?;
            let col = cols
                .get(&collection)
                .ok_or_else(|| StoreError::CollectionNotFound(collection.clone()))?;
            Ok(col
                .points
                .iter()
                .filter(|(_, sp)| filter.matches(&sp.metadata))
                .map(|(id, sp)| StoredDocument {
                    id: id.clone(),
                    document: sp.document.clone(),
                    metadata: sp.metadata.clone(),
                })
                .collect())
        })
    }

    fn count(&self, collection: &str) -> BoxFuture<'_, Result<u64, StoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self.collections.read().map_err(|e| poisoned(&e))?;
            let col = cols
                .get(&collection)
                .ok_or(StoreError::CollectionNotFound(collection))?;
            Ok(col.points.len() as u64)
        })
    }

    fn list_collections(&self) -> BoxFuture<'_, Result<Vec<(String, u64)>, StoreError>> {
        Box::pin(async move {
            let cols = self.collections.read().map_err(|e| poisoned(&e))?;
            Ok(cols
                .iter()
                .map(|(name, col)| (name.clone(), col.points.len() as u64))
                .collect())
        })
    }

    fn collection_info(
        &self,
        collection: &str,
    ) -> BoxFuture<'_, Result<CollectionInfo, StoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self.collections.read().map_err(|e| poisoned(&e))?;
            let col = cols
                .get(&collection)
                .ok_or_else(|| StoreError::CollectionNotFound(collection.clone()))?;
            let sample_metadata = col
                .points
                .iter()
                .min_by(|a, b| a.0.cmp(b.0))
                .map(|(_, sp)| sp.metadata.clone());
            Ok(CollectionInfo {
                name: collection,
                count: col.points.len() as u64,
                sample_metadata,
            })
        })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), StoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self.collections.write().map_err(|e| poisoned(&e))?;
            cols.remove(&collection)
                .map(|_| ())
                .ok_or(StoreError::CollectionNotFound(collection))
        })
    }
}
