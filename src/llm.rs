//! OpenAI chat completions client with function calling
//!
//! The model receives the kernel function definitions and decides which of
//! them to call. Uses a long-lived reqwest::Client for connection pooling.

use crate::config::ExecutionSettings;
use crate::error::AssistantError;
use crate::models::{ChatMessage, ChatRole, FunctionDefinition, ToolCall};
use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info};

/// One model turn: either text, tool calls, or both
#[derive(Debug, Clone, Default)]
pub struct ModelTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<String>,
}

/// Trait for the reasoning service that selects functions
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionDefinition],
        settings: &ExecutionSettings,
    ) -> Result<ModelTurn>;
}

/// Reusable OpenAI client (connection-pooled)
pub struct OpenAiChatClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl ChatModel for OpenAiChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionDefinition],
        settings: &ExecutionSettings,
    ) -> Result<ModelTurn> {
        if self.api_key.is_empty() {
            return Err(AssistantError::ConfigError(
                "OPENAI_API_KEY not configured".to_string(),
            ));
        }

        let request = build_request(&self.model, messages, functions, settings);
        let url = format!("{}/chat/completions", self.base_url);

        info!(
            model = %self.model,
            messages = messages.len(),
            functions = functions.len(),
            "Calling OpenAI chat completions"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("OpenAI API request failed: {}", e);
                AssistantError::LlmError(format!("OpenAI API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenAI API error response: {}", error_text);
            return Err(AssistantError::LlmError(format!(
                "OpenAI API returned {}: {}",
                status, error_text
            )));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!("Failed to parse OpenAI response: {}", e);
            AssistantError::LlmError(format!("OpenAI parse error: {}", e))
        })?;

        if let Some(usage) = &parsed.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "OpenAI token usage"
            );
        }

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AssistantError::LlmError("No choices in OpenAI response".to_string()))?;

        Ok(turn_from_message(choice.message, choice.finish_reason))
    }
}

fn build_request(
    model: &str,
    messages: &[ChatMessage],
    functions: &[FunctionDefinition],
    settings: &ExecutionSettings,
) -> ChatCompletionRequest {
    let tools: Vec<WireTool> = functions
        .iter()
        .map(|f| WireTool {
            tool_type: "function".to_string(),
            function: WireFunction {
                name: f.name.clone(),
                description: f.description.clone(),
                parameters: f.parameters.clone(),
            },
        })
        .collect();

    let has_tools = !tools.is_empty();

    ChatCompletionRequest {
        model: model.to_string(),
        messages: messages.iter().map(WireMessage::from).collect(),
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
        tool_choice: has_tools.then(|| settings.function_choice.as_str().to_string()),
        tools: has_tools.then_some(tools),
    }
}

fn turn_from_message(message: WireMessage, finish_reason: Option<String>) -> ModelTurn {
    let tool_calls = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolCall {
            id: call.id,
            name: call.function.name,
            // Arguments arrive as a JSON-encoded string
            arguments: serde_json::from_str::<Value>(&call.function.arguments)
                .unwrap_or_else(|_| json!({})),
        })
        .collect();

    ModelTurn {
        content: message.content.filter(|c| !c.trim().is_empty()),
        tool_calls,
        finish_reason,
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        let tool_calls = (message.role == ChatRole::Assistant && !message.tool_calls.is_empty())
            .then(|| {
                message
                    .tool_calls
                    .iter()
                    .map(|call| WireToolCall {
                        id: call.id.clone(),
                        call_type: "function".to_string(),
                        function: WireFunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.to_string(),
                        },
                    })
                    .collect()
            });

        Self {
            role: message.role.to_string(),
            content: message.content.clone(),
            tool_calls,
            tool_call_id: message.tool_call_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
