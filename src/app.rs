//! Wiring of stores, embedder, model and assistant from `Settings`

use crate::agent::HrAssistant;
use crate::config::Settings;
use crate::leaves::{InMemoryLeaveStore, LeaveStore, PgLeaveStore};
use crate::llm::OpenAiChatClient;
use crate::plugin::HrPlugin;
use crate::policy::{
    seed_default_policies, Embedder, HashingEmbedder, InMemoryPolicyStore, OpenAiEmbedder,
    PolicyStore, QdrantPolicyStore,
};
use crate::tools::create_hr_registry;
use crate::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Embedding backend for policy documents
pub fn build_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    match &settings.openai_api_key {
        Some(key) => {
            info!(model = %settings.embedding_model, "Using OpenAI embeddings");
            Ok(Arc::new(OpenAiEmbedder::new(
                key.clone(),
                settings.openai_base_url.clone(),
                settings.embedding_model.clone(),
            )?))
        }
        None => {
            warn!("No OpenAI key; policy search uses local hashing embeddings");
            Ok(Arc::new(HashingEmbedder::default()))
        }
    }
}

pub async fn build_leave_store(settings: &Settings) -> Result<Arc<dyn LeaveStore>> {
    match &settings.database_url {
        Some(url) => {
            let store = PgLeaveStore::connect(url).await?;
            info!("✅ Connected to leave database");
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory sample leave balances");
            Ok(Arc::new(InMemoryLeaveStore::with_sample_data()))
        }
    }
}

pub fn build_policy_store(
    settings: &Settings,
    embedder: Arc<dyn Embedder>,
) -> Result<Arc<dyn PolicyStore>> {
    match &settings.qdrant_url {
        Some(url) => {
            info!(url = %url, collection = %settings.policy_collection, "Using Qdrant policy store");
            Ok(Arc::new(QdrantPolicyStore::connect(
                url,
                settings.qdrant_api_key.clone(),
                settings.policy_collection.clone(),
                embedder,
            )?))
        }
        None => {
            info!("QDRANT_URL not set; using in-memory policy store");
            Ok(Arc::new(InMemoryPolicyStore::new(embedder)))
        }
    }
}

/// Build the HR plugin over the configured stores, with default policies seeded
pub async fn build_plugin(settings: &Settings) -> Result<Arc<HrPlugin>> {
    let embedder = build_embedder(settings)?;
    let leaves = build_leave_store(settings).await?;
    let policies = build_policy_store(settings, embedder)?;

    let seeded = seed_default_policies(policies.as_ref()).await?;
    if seeded > 0 {
        info!(count = seeded, "Seeded default policy documents");
    }

    Ok(Arc::new(HrPlugin::new(leaves, policies)))
}

/// Plugin plus an assistant talking to the OpenAI chat model.
///
/// Fails with a configuration error when no API key is available.
pub async fn build_runtime(settings: &Settings) -> Result<(Arc<HrPlugin>, Arc<HrAssistant>)> {
    let api_key = settings.require_api_key()?.to_string();

    let plugin = build_plugin(settings).await?;
    let model = Arc::new(OpenAiChatClient::new(
        api_key,
        settings.openai_base_url.clone(),
        settings.chat_model.clone(),
    )?);

    let registry = create_hr_registry(plugin.clone());
    info!(
        model = %model.model(),
        functions = ?registry.list(),
        "✅ HR assistant initialized"
    );

    let assistant = Arc::new(HrAssistant::new(
        model,
        registry,
        settings.execution.clone(),
    ));

    Ok((plugin, assistant))
}
