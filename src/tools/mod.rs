//! Kernel function trait and registry
//!
//! Each tool is a function the model may select. Tools are grouped under a
//! plugin name, and the model sees the fully-qualified `{plugin}-{function}`.

use crate::error::AssistantError;
use crate::models::{FunctionDefinition, ToolInput, ToolOutput};
use crate::Result;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub mod hr;
pub use hr::{create_hr_registry, GetLeaveBalanceTool, QueryPolicyTool};

/// Trait for a single kernel function
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON schema of the arguments object
    fn parameters(&self) -> Value;
    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput>;
}

/// Tool registry for looking up and executing tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn qualified_name(plugin_name: &str, function_name: &str) -> String {
        format!("{}-{}", plugin_name, function_name)
    }

    pub fn register(&mut self, plugin_name: &str, tool: Arc<dyn Tool>) {
        self.tools
            .insert(Self::qualified_name(plugin_name, tool.name()), tool);
    }

    /// Look up by qualified name, falling back to a unique bare function name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        if let Some(tool) = self.tools.get(name) {
            return Some(tool.clone());
        }

        let mut bare = self.tools.values().filter(|t| t.name() == name);
        match (bare.next(), bare.next()) {
            (Some(tool), None) => Some(tool.clone()),
            _ => None,
        }
    }

    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Function metadata for the model, sorted by name
    pub fn definitions(&self) -> Vec<FunctionDefinition> {
        let mut definitions: Vec<FunctionDefinition> = self
            .tools
            .iter()
            .map(|(name, tool)| FunctionDefinition {
                name: name.clone(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Schema for a function taking one required string argument
pub fn single_string_schema(name: &str, description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            name: {
                "type": "string",
                "description": description,
            }
        },
        "required": [name],
        "additionalProperties": false,
    })
}

fn ensure_object_parameters(input: &ToolInput) -> Result<()> {
    if input.parameters.is_object() {
        Ok(())
    } else {
        Err(AssistantError::InvalidToolInput(
            "tool_input must be a JSON object".to_string(),
        ))
    }
}

/// A required, non-blank string argument
pub fn require_string_arg(input: &ToolInput, key: &str) -> Result<String> {
    ensure_object_parameters(input)?;

    input
        .parameters
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            AssistantError::InvalidToolInput(format!(
                "Expected '{}' in arguments for {}",
                key, input.tool_name
            ))
        })
}
