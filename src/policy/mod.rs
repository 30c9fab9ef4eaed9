//! Policy knowledge base
//!
//! Policy text is embedded and stored in a vector collection; questions are
//! answered by nearest-neighbour search over those embeddings.

use crate::models::{PolicyDocument, PolicyMatch};
use crate::Result;
use tracing::info;

pub mod embeddings;
pub mod memory;
pub mod qdrant;

pub use embeddings::{Embedder, HashingEmbedder, OpenAiEmbedder};
pub use memory::InMemoryPolicyStore;
pub use qdrant::QdrantPolicyStore;

pub const DEFAULT_POLICY_ID: &str = "policy1";
pub const DEFAULT_POLICY_TEXT: &str =
    "Company policy: Employees are entitled to 20 days annual leave per year.";

/// Trait for policy document storage and semantic search
#[async_trait::async_trait]
pub trait PolicyStore: Send + Sync {
    /// Number of stored documents
    async fn count(&self) -> Result<u64>;

    /// Insert documents, replacing any with the same id
    async fn upsert(&self, documents: &[PolicyDocument]) -> Result<()>;

    /// Up to `n_results` closest documents, best first
    async fn query(&self, text: &str, n_results: usize) -> Result<Vec<PolicyMatch>>;
}

/// Documents inserted into an empty collection
pub fn default_policies() -> Vec<PolicyDocument> {
    vec![PolicyDocument::new(DEFAULT_POLICY_ID, DEFAULT_POLICY_TEXT).with_metadata("type", "policy")]
}

/// Seed the default policies when the collection is empty.
///
/// Returns the number of documents inserted.
pub async fn seed_default_policies(store: &dyn PolicyStore) -> Result<usize> {
    if store.count().await? > 0 {
        return Ok(0);
    }

    let documents = default_policies();
    store.upsert(&documents).await?;
    info!(count = documents.len(), "Seeded default policies");
    Ok(documents.len())
}

/// Cosine similarity; zero when either vector is empty or all zeros
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
