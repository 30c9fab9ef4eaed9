//! Runtime configuration
//!
//! Everything is read from the process environment, after loading `.env`.

use crate::error::AssistantError;
use crate::Result;
use tracing::warn;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_POLICY_COLLECTION: &str = "policies";
pub const DEFAULT_API_PORT: u16 = 8080;

const PLACEHOLDER_KEYS: &[&str] = &["", "your_openai_api_key_here", "sk-..."];

/// How the model may pick functions for a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionChoice {
    /// The model decides whether and which functions to call
    Auto,
    /// The model must call at least one function
    Required,
    /// Functions are advertised but must not be called
    None,
}

impl FunctionChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionChoice::Auto => "auto",
            FunctionChoice::Required => "required",
            FunctionChoice::None => "none",
        }
    }
}

/// Per-request settings handed to the chat model
#[derive(Debug, Clone)]
pub struct ExecutionSettings {
    pub function_choice: FunctionChoice,
    pub max_tokens: u32,
    /// Kept low so routing stays consistent between runs
    pub temperature: f32,
    pub max_tool_rounds: u32,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            function_choice: FunctionChoice::Auto,
            max_tokens: 1000,
            temperature: 0.1,
            max_tool_rounds: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub database_url: Option<String>,
    pub qdrant_url: Option<String>,
    pub qdrant_api_key: Option<String>,
    pub policy_collection: String,
    pub api_port: u16,
    pub execution: ExecutionSettings,
}

impl Settings {
    /// Load `.env` (if present) and resolve settings from the environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai_api_key = non_empty("OPENAI_API_KEY")
            .filter(|key| !PLACEHOLDER_KEYS.contains(&key.trim()));

        let api_port = match non_empty("PORT").or_else(|| non_empty("API_PORT")) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                AssistantError::ConfigError(format!("Invalid port '{}': {}", raw, e))
            })?,
            None => DEFAULT_API_PORT,
        };

        Ok(Self {
            openai_api_key,
            openai_base_url: non_empty("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            chat_model: non_empty("OPENAI_CHAT_MODEL")
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            embedding_model: non_empty("OPENAI_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            database_url: non_empty("DATABASE_URL"),
            qdrant_url: non_empty("QDRANT_URL"),
            qdrant_api_key: non_empty("QDRANT_API_KEY"),
            policy_collection: non_empty("POLICY_COLLECTION")
                .unwrap_or_else(|| DEFAULT_POLICY_COLLECTION.to_string()),
            api_port,
            execution: ExecutionSettings::default(),
        })
    }

    /// The OpenAI key, or a configuration error explaining how to set it.
    pub fn require_api_key(&self) -> Result<&str> {
        self.openai_api_key.as_deref().ok_or_else(|| {
            warn!("OPENAI_API_KEY is missing or still a placeholder");
            AssistantError::ConfigError(
                "OPENAI_API_KEY not found in environment variables. Please set your OpenAI API key in a .env file".to_string(),
            )
        })
    }
}
