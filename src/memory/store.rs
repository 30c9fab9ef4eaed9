//! Chat history storage
//!
//! Holds the transcript of one question: system prompt, user turn, the
//! model's tool calls and the function results fed back to it.

use crate::models::{ChatMessage, ChatRole, ToolCall};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Approximate token count, four characters per token
fn estimate_tokens(message: &ChatMessage) -> usize {
    let content_len = message.content.as_deref().map(str::len).unwrap_or(0);
    let calls_len: usize = message
        .tool_calls
        .iter()
        .map(|c| c.name.len() + c.arguments.to_string().len())
        .sum();
    (content_len + calls_len + 3) / 4
}

#[derive(Debug, Clone)]
pub struct ChatHistory {
    pub conversation_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    messages: Vec<ChatMessage>,
    total_tokens: usize,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self {
            conversation_id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            messages: Vec::new(),
            total_tokens: 0,
        }
    }

    /// History opened with a system message
    pub fn with_system_message(prompt: impl Into<String>) -> Self {
        let mut history = Self::new();
        history.add_message(ChatMessage::system(prompt));
        history
    }

    pub fn add_message(&mut self, message: ChatMessage) {
        self.total_tokens += estimate_tokens(&message);
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.add_message(ChatMessage::user(content));
    }

    pub fn add_assistant_message(&mut self, content: Option<String>, tool_calls: Vec<ToolCall>) {
        self.add_message(ChatMessage::assistant(content, tool_calls));
    }

    pub fn add_tool_result(&mut self, call_id: impl Into<String>, content: impl Into<String>) {
        self.add_message(ChatMessage::tool(call_id, content));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    /// Tool results recorded so far
    pub fn tool_results(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| m.role == ChatRole::Tool)
    }

    /// Plain-text transcript, useful in debug logs
    pub fn get_formatted_transcript(&self) -> String {
        let mut transcript = String::new();

        for msg in &self.messages {
            transcript.push_str(&format!("[{}] ", msg.role));

            if let Some(content) = &msg.content {
                transcript.push_str(content);
            }

            for call in &msg.tool_calls {
                transcript.push_str(&format!(" -> {}({})", call.name, call.arguments));
            }

            transcript.push('\n');
        }

        transcript
    }
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::new()
    }
}
