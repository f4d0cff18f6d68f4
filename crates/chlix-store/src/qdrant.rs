//! Qdrant-backed document store.

use std::collections::HashMap;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder,
    Distance, FieldType, Filter, PointId, PointStruct, ScrollPointsBuilder, SearchPointsBuilder,
    UpsertPointsBuilder, Value, VectorParamsBuilder, value::Kind,
};

use crate::document_store::{
    BoxFuture, CollectionInfo, Document, DocumentStore, FieldCondition, FieldValue, Metadata,
    MetadataFilter, QueryHit, StoredDocument,
};
use crate::embedding::{Embedder, PROBE_TEXT};
use crate::error::StoreError;

/// Payload key holding the document text.
const DOCUMENT_KEY: &str = "document";

/// Payload fields that get a keyword index for exact-match filtering.
const INDEXED_FIELDS: &[&str] = &["file_path", "file_type"];

const SCROLL_PAGE: u32 = 256;

/// [`DocumentStore`] over a Qdrant server, embedding text with `E`.
pub struct QdrantDocumentStore<E> {
    client: Qdrant,
    embedder: E,
}

impl<E> std::fmt::Debug for QdrantDocumentStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantDocumentStore").finish_non_exhaustive()
    }
}

impl<E: Embedder> QdrantDocumentStore<E> {
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the client cannot be built from `url`.
    pub fn new(url: &str, embedder: E) -> Result<Self, StoreError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| StoreError::Connection(format!("Qdrant at {url}: {e}")))?;
        Ok(Self { client, embedder })
    }

    async fn exists(&self, collection: &str) -> Result<bool, StoreError> {
        self.client
            .collection_exists(collection)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }

    async fn require(&self, collection: &str) -> Result<(), StoreError> {
        if self.exists(collection).await? {
            Ok(())
        } else {
            Err(StoreError::CollectionNotFound(collection.to_owned()))
        }
    }

    async fn exact_count(&self, collection: &str) -> Result<u64, StoreError> {
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(response.result.map_or(0, |r| r.count))
    }

    async fn scroll(
        &self,
        collection: &str,
        filter: Option<Filter>,
        max: Option<u32>,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let mut documents = Vec::new();
        let mut offset: Option<PointId> = None;

        loop {
            let mut builder = ScrollPointsBuilder::new(collection)
                .with_payload(true)
                .with_vectors(false)
                .limit(max.unwrap_or(SCROLL_PAGE));
            if let Some(f) = filter.clone() {
                builder = builder.filter(f);
            }
            if let Some(off) = offset.take() {
                builder = builder.offset(off);
            }

            let response = self
                .client
                .scroll(builder)
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;

            for point in response.result {
                let (document, metadata) = split_payload(point.payload);
                documents.push(StoredDocument {
                    id: point_id_to_string(point.id),
                    document,
                    metadata,
                });
            }

            match response.next_page_offset {
                Some(next) if max.is_none() => offset = Some(next),
                _ => break,
            }
        }

        Ok(documents)
    }
}

impl<E: Embedder> DocumentStore for QdrantDocumentStore<E> {
    fn get_or_create_collection(
        &self,
        collection: &str,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            if self.exists(&collection).await? {
                return Ok(());
            }

            let probe = self.embedder.embed(PROBE_TEXT).await?;
            let vector_size = u64::try_from(probe.len())
                .map_err(|e| StoreError::Embedding(format!("embedding too large: {e}")))?;

            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&collection)
                        .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine)),
                )
                .await
                .map_err(|e| StoreError::Connection(e.to_string()))?;

            for field in INDEXED_FIELDS {
                self.client
                    .create_field_index(CreateFieldIndexCollectionBuilder::new(
                        &collection,
                        *field,
                        FieldType::Keyword,
                    ))
                    .await
                    .map_err(|e| StoreError::Connection(e.to_string()))?;
            }

            tracing::info!(
                collection = %collection,
                vector_size,
                embedder = self.embedder.name(),
                "created collection"
            );
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
            if documents.is_empty() {
                return Ok(());
            }
            self.require(&collection).await?;

            let mut points = Vec::with_capacity(documents.len());
            for doc in documents {
                let vector = self.embedder.embed(&doc.text).await?;
                let mut body: serde_json::Map<String, serde_json::Value> =
                    doc.metadata.into_iter().collect();
                body.insert(DOCUMENT_KEY.into(), serde_json::Value::String(doc.text));
                let payload: HashMap<String, Value> =
                    serde_json::from_value(serde_json::Value::Object(body))?;
                points.push(PointStruct::new(doc.id, vector, payload));
            }

            self.client
                .upsert_points(UpsertPointsBuilder::new(&collection, points).wait(true))
                .await
                .map_err(|e| StoreError::Upsert(e.to_string()))?;
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
            self.require(&collection).await?;
            let vector = self.embedder.embed(&text).await?;

            let mut builder =
                SearchPointsBuilder::new(&collection, vector, limit).with_payload(true);
            if let Some(f) = filter {
                builder = builder.filter(metadata_filter_to_qdrant(f));
            }

            let response = self
                .client
                .search_points(builder)
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;

            Ok(response
                .result
                .into_iter()
                .map(|point| {
                    let (document, metadata) = split_payload(point.payload);
                    QueryHit {
                        id: point_id_to_string(point.id),
                        document,
                        metadata,
                        distance: Some(1.0 - point.score),
                    }
                })
                .collect())
        })
    }

    fn get_documents(
        &self,
        collection: &str,
        filter: MetadataFilter,
    ) -> BoxFuture<'_, Result<Vec<StoredDocument>, StoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.require(&collection).await?;
            self.scroll(&collection, Some(metadata_filter_to_qdrant(filter)), None)
                .await
        })
    }

    fn count(&self, collection: &str) -> BoxFuture<'_, Result<u64, StoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.require(&collection).await?;
            self.exact_count(&collection).await
        })
    }

    fn list_collections(&self) -> BoxFuture<'_, Result<Vec<(String, u64)>, StoreError>> {
        Box::pin(async move {
            let response = self
                .client
                .list_collections()
                .await
                .map_err(|e| StoreError::Connection(e.to_string()))?;

            let mut names: Vec<String> =
                response.collections.into_iter().map(|c| c.name).collect();
            names.sort();

            let mut result = Vec::with_capacity(names.len());
            for name in names {
                let count = self.exact_count(&name).await?;
                result.push((name, count));
            }
            Ok(result)
        })
    }

    fn collection_info(
        &self,
        collection: &str,
    ) -> BoxFuture<'_, Result<CollectionInfo, StoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.require(&collection).await?;
            let count = self.exact_count(&collection).await?;
            let sample_metadata = if count > 0 {
                self.scroll(&collection, None, Some(1))
                    .await?
                    .into_iter()
                    .next()
                    .map(|d| d.metadata)
            } else {
                None
            };
            Ok(CollectionInfo {
                name: collection,
                count,
                sample_metadata,
            })
        })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), StoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.require(&collection).await?;
            self.client
                .delete_collection(&collection)
                .await
                .map_err(|e| StoreError::Connection(e.to_string()))?;
            Ok(())
        })
    }
}

fn metadata_filter_to_qdrant(filter: MetadataFilter) -> Filter {
    Filter::must(filter.must.into_iter().map(field_condition_to_qdrant))
}

fn field_condition_to_qdrant(cond: FieldCondition) -> Condition {
    match cond.value {
        FieldValue::Integer(v) => Condition::matches(cond.field, v),
        FieldValue::Text(v) => Condition::matches(cond.field, v),
    }
}

/// Separate the document text from the rest of a point payload.
fn split_payload(payload: HashMap<String, Value>) -> (String, Metadata) {
    let mut document = String::new();
    let mut metadata = Metadata::new();
    for (key, value) in payload {
        if key == DOCUMENT_KEY {
            if let Some(Kind::StringValue(s)) = value.kind {
                document = s;
            }
            continue;
        }
        if let Some(json) = value_to_json(value) {
            metadata.insert(key, json);
        }
    }
    (document, metadata)
}

fn value_to_json(value: Value) -> Option<serde_json::Value> {
    let json = match value.kind? {
        Kind::NullValue(_) => serde_json::Value::Null,
        Kind::BoolValue(b) => serde_json::Value::Bool(b),
        Kind::IntegerValue(i) => serde_json::Value::Number(i.into()),
        Kind::DoubleValue(d) => serde_json::Number::from_f64(d).map(serde_json::Value::Number)?,
        Kind::StringValue(s) => serde_json::Value::String(s),
        Kind::ListValue(list) => {
            serde_json::Value::Array(list.values.into_iter().filter_map(value_to_json).collect())
        }
        Kind::StructValue(st) => serde_json::Value::Object(
            st.fields
                .into_iter()
                .filter_map(|(k, v)| value_to_json(v).map(|j| (k, j)))
                .collect(),
        ),
    };
    Some(json)
}

fn point_id_to_string(id: Option<PointId>) -> String {
    match id.and_then(|pid| pid.point_id_options) {
        Some(PointIdOptions::Uuid(u)) => u,
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}
