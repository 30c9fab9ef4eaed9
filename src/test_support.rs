//! Shared fixtures for unit tests

use crate::agent::HrAssistant;
use crate::config::ExecutionSettings;
use crate::error::AssistantError;
use crate::leaves::InMemoryLeaveStore;
use crate::llm::{ChatModel, ModelTurn};
use crate::models::{ChatMessage, FunctionDefinition, ToolCall};
use crate::plugin::HrPlugin;
use crate::policy::{seed_default_policies, HashingEmbedder, InMemoryPolicyStore};
use crate::tools::create_hr_registry;
use crate::Result;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Replays canned turns and records what it was sent
pub struct ScriptedModel {
    turns: Mutex<VecDeque<ModelTurn>>,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn new(turns: Vec<ModelTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionDefinition],
        _settings: &ExecutionSettings,
    ) -> Result<ModelTurn> {
        assert_eq!(functions.len(), 2, "both HR functions are advertised");
        self.seen.lock().unwrap().push(messages.to_vec());
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AssistantError::LlmError("script exhausted".to_string()))
    }
}

pub fn call(id: &str, name: &str, arguments: serde_json::Value) -> ModelTurn {
    ModelTurn {
        content: None,
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }],
        finish_reason: Some("tool_calls".to_string()),
    }
}

pub fn answer(text: &str) -> ModelTurn {
    ModelTurn {
        content: Some(text.to_string()),
        tool_calls: vec![],
        finish_reason: Some("stop".to_string()),
    }
}

/// Plugin over the sample balances and the default policy
pub async fn sample_plugin() -> Arc<HrPlugin> {
    let policies = Arc::new(InMemoryPolicyStore::new(Arc::new(HashingEmbedder::default())));
    seed_default_policies(policies.as_ref()).await.unwrap();
    Arc::new(HrPlugin::new(
        Arc::new(InMemoryLeaveStore::with_sample_data()),
        policies,
    ))
}

pub async fn assistant_with(model: Arc<ScriptedModel>) -> HrAssistant {
    HrAssistant::new(
        model,
        create_hr_registry(sample_plugin().await),
        ExecutionSettings::default(),
    )
}
