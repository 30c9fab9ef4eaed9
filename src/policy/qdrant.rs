//! Qdrant-backed policy store
//!
//! The collection is created on first insert, sized from the embeddings.
//! Qdrant only accepts integer or UUID point ids, so document ids are mapped
//! to a stable UUID and the original id is kept in the payload.

use super::{Embedder, PolicyStore};
use crate::error::AssistantError;
use crate::models::{PolicyDocument, PolicyMatch};
use crate::Result;
use qdrant_client::qdrant::{
    value::Kind, vectors_config::Config, CountPointsBuilder, CreateCollectionBuilder, Distance,
    PointStruct, SearchPointsBuilder, Struct, UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

const TEXT_KEY: &str = "text";
const POLICY_ID_KEY: &str = "policy_id";
const METADATA_KEY: &str = "metadata";

pub type Payload = HashMap<String, Value>;

/// A point ready to be written to a collection
#[derive(Debug, Clone)]
pub struct StoredPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

/// The collection operations the policy store needs
#[async_trait::async_trait]
pub trait VectorCollection: Send + Sync {
    fn name(&self) -> &str;

    /// Configured vector size, `None` when the collection does not exist
    async fn vector_size(&self) -> Result<Option<u64>>;

    async fn create(&self, vector_dim: u64) -> Result<()>;

    async fn count(&self) -> Result<u64>;

    async fn upsert(&self, points: Vec<StoredPoint>) -> Result<()>;

    /// Closest points with their scores, best first
    async fn search(&self, vector: Vec<f32>, limit: u64) -> Result<Vec<(f32, Payload)>>;
}

/// A named collection on a Qdrant server
pub struct QdrantCollection {
    client: Qdrant,
    name: String,
}

impl QdrantCollection {
    pub fn connect(url: &str, api_key: Option<String>, name: impl Into<String>) -> Result<Self> {
        let mut builder = Qdrant::from_url(url);

        if let Some(api_key) = api_key {
            builder = builder.api_key(api_key);
            info!("Qdrant connection using API key authentication");
        }

        let client = builder
            .build()
            .map_err(|e| AssistantError::VectorStoreError(e.to_string()))?;

        Ok(Self {
            client,
            name: name.into(),
        })
    }
}

fn store_error(e: impl std::fmt::Display) -> AssistantError {
    AssistantError::VectorStoreError(e.to_string())
}

#[async_trait::async_trait]
impl VectorCollection for QdrantCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn vector_size(&self) -> Result<Option<u64>> {
        if !self.client.collection_exists(&self.name).await.map_err(store_error)? {
            return Ok(None);
        }

        let info = self
            .client
            .collection_info(&self.name)
            .await
            .map_err(store_error)?;

        let config = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config);

        match config {
            Some(Config::Params(params)) => Ok(Some(params.size)),
            Some(Config::ParamsMap(_)) => Err(AssistantError::VectorStoreError(format!(
                "Collection '{}' uses named vectors; a single unnamed vector is required",
                self.name
            ))),
            None => Err(AssistantError::VectorStoreError(format!(
                "Collection '{}' has no vector configuration",
                self.name
            ))),
        }
    }

    async fn create(&self, vector_dim: u64) -> Result<()> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.name)
                    .vectors_config(VectorParamsBuilder::new(vector_dim, Distance::Cosine)),
            )
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.name).exact(true))
            .await
            .map_err(store_error)?;

        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }

    async fn upsert(&self, points: Vec<StoredPoint>) -> Result<()> {
        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|p| PointStruct::new(p.id, p.vector, p.payload))
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.name, points).wait(true))
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn search(&self, vector: Vec<f32>, limit: u64) -> Result<Vec<(f32, Payload)>> {
        let results = self
            .client
            .search_points(SearchPointsBuilder::new(&self.name, vector, limit).with_payload(true))
            .await
            .map_err(store_error)?;

        Ok(results
            .result
            .into_iter()
            .map(|point| (point.score, point.payload))
            .collect())
    }
}

pub struct QdrantPolicyStore {
    collection: Arc<dyn VectorCollection>,
    embedder: Arc<dyn Embedder>,
    vector_dim: OnceCell<u64>,
}

impl QdrantPolicyStore {
    pub fn connect(
        url: &str,
        api_key: Option<String>,
        collection: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let collection = QdrantCollection::connect(url, api_key, collection)?;
        Ok(Self::with_collection(Arc::new(collection), embedder))
    }

    pub fn with_collection(
        collection: Arc<dyn VectorCollection>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            collection,
            embedder,
            vector_dim: OnceCell::new(),
        }
    }

    /// Vector size of the collection, remembered once it is known
    async fn collection_dim(&self) -> Result<Option<u64>> {
        if let Some(dim) = self.vector_dim.get() {
            return Ok(Some(*dim));
        }

        let dim = self.collection.vector_size().await?;
        if let Some(dim) = dim {
            let _ = self.vector_dim.set(dim);
        }
        Ok(dim)
    }

    fn check_dim(&self, collection_dim: u64, embedding_dim: usize) -> Result<()> {
        if collection_dim == embedding_dim as u64 {
            return Ok(());
        }

        warn!(
            collection = %self.collection.name(),
            collection_dim,
            embedding_dim,
            "Embedding size does not match the policy collection"
        );
        Err(AssistantError::VectorStoreError(format!(
            "Collection '{}' stores {}-dimension vectors but the embedder produces {}; \
             recreate the collection or use the embedder it was built with",
            self.collection.name(),
            collection_dim,
            embedding_dim
        )))
    }

    async fn ensure_collection(&self, vector_dim: usize) -> Result<()> {
        if let Some(existing) = self.collection_dim().await? {
            return self.check_dim(existing, vector_dim);
        }

        self.collection.create(vector_dim as u64).await?;
        let _ = self.vector_dim.set(vector_dim as u64);

        info!(collection = %self.collection.name(), vector_dim, "Created policy collection");
        Ok(())
    }
}

/// Deterministic UUID for a document id
pub fn point_id_for(document_id: &str) -> String {
    let hash = Sha256::digest(document_id.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    uuid::Uuid::from_bytes(bytes).to_string()
}

/// Metadata sits in its own struct so it cannot shadow `text` or `policy_id`
fn payload_for(document: &PolicyDocument) -> Payload {
    let metadata: HashMap<String, Value> = document
        .metadata
        .iter()
        .map(|(k, v)| (k.clone(), Value::from(v.clone())))
        .collect();

    let mut payload = Payload::new();
    payload.insert(TEXT_KEY.to_string(), document.content.clone().into());
    payload.insert(POLICY_ID_KEY.to_string(), document.id.clone().into());
    payload.insert(
        METADATA_KEY.to_string(),
        Value {
            kind: Some(Kind::StructValue(Struct { fields: metadata })),
        },
    );

    payload
}

fn document_from_payload(payload: Payload) -> PolicyDocument {
    let mut document = PolicyDocument::new(String::new(), String::new());

    for (k, v) in payload {
        match (k.as_str(), v.kind) {
            (TEXT_KEY, Some(Kind::StringValue(s))) => document.content = s,
            (POLICY_ID_KEY, Some(Kind::StringValue(s))) => document.id = s,
            (METADATA_KEY, Some(Kind::StructValue(fields))) => {
                for (name, value) in fields.fields {
                    if let Some(Kind::StringValue(s)) = value.kind {
                        document.metadata.insert(name, s);
                    }
                }
            }
            _ => {}
        }
    }

    document
}

#[async_trait::async_trait]
impl PolicyStore for QdrantPolicyStore {
    async fn count(&self) -> Result<u64> {
        if self.collection_dim().await?.is_none() {
            return Ok(0);
        }

        self.collection.count().await
    }

    async fn upsert(&self, documents: &[PolicyDocument]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let embeddings = self.embedder.embed(&texts).await?;

        if embeddings.len() != documents.len() {
            return Err(AssistantError::VectorStoreError(
                "Document and embedding count mismatch".to_string(),
            ));
        }

        let vector_dim = embeddings.first().map(Vec::len).unwrap_or_default();
        self.ensure_collection(vector_dim).await?;

        let points: Vec<StoredPoint> = documents
            .iter()
            .zip(embeddings)
            .map(|(doc, vector)| StoredPoint {
                id: point_id_for(&doc.id),
                vector,
                payload: payload_for(doc),
            })
            .collect();

        debug!(collection = %self.collection.name(), points = points.len(), "Upserting policies");
        self.collection.upsert(points).await
    }

    async fn query(&self, text: &str, n_results: usize) -> Result<Vec<PolicyMatch>> {
        if n_results == 0 {
            return Ok(Vec::new());
        }

        let Some(collection_dim) = self.collection_dim().await? else {
            return Ok(Vec::new());
        };

        let query_embedding = self
            .embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AssistantError::EmbeddingError("Empty query embedding".to_string()))?;

        self.check_dim(collection_dim, query_embedding.len())?;

        let results = self
            .collection
            .search(query_embedding, n_results as u64)
            .await?;

        Ok(results
            .into_iter()
            .map(|(score, payload)| PolicyMatch {
                score,
                document: document_from_payload(payload),
            })
            .collect())
    }
}
