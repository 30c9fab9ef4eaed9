//! In-memory policy store (offline runs and tests)

use super::{cosine_similarity, Embedder, PolicyStore};
use crate::error::AssistantError;
use crate::models::{PolicyDocument, PolicyMatch};
use crate::Result;
use std::sync::Arc;
use tokio::sync::RwLock;

struct StoredPolicy {
    document: PolicyDocument,
    embedding: Vec<f32>,
}

pub struct InMemoryPolicyStore {
    embedder: Arc<dyn Embedder>,
    entries: RwLock<Vec<StoredPolicy>>,
}

impl InMemoryPolicyStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn count(&self) -> Result<u64> {
        Ok(self.entries.read().await.len() as u64)
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

        let mut entries = self.entries.write().await;
        for (document, embedding) in documents.iter().zip(embeddings) {
            match entries.iter_mut().find(|e| e.document.id == document.id) {
                Some(existing) => {
                    existing.document = document.clone();
                    existing.embedding = embedding;
                }
                None => entries.push(StoredPolicy {
                    document: document.clone(),
                    embedding,
                }),
            }
        }

        Ok(())
    }

    async fn query(&self, text: &str, n_results: usize) -> Result<Vec<PolicyMatch>> {
        if n_results == 0 {
            return Ok(Vec::new());
        }

        let entries = self.entries.read().await;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self
            .embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AssistantError::EmbeddingError("Empty query embedding".to_string()))?;

        let mut matches: Vec<PolicyMatch> = entries
            .iter()
            .map(|entry| PolicyMatch {
                document: entry.document.clone(),
                score: cosine_similarity(&query_embedding, &entry.embedding),
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(n_results);
        Ok(matches)
    }
}
