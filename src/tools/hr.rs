//! HR kernel functions exposed to the model

use super::{require_string_arg, single_string_schema, Tool, ToolRegistry};
use crate::models::{ToolInput, ToolOutput};
use crate::plugin::{
    describe_balance, describe_policy, HrPlugin, GET_LEAVE_BALANCE_DESCRIPTION, PLUGIN_NAME,
    QUERY_POLICY_DESCRIPTION,
};
use crate::Result;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct GetLeaveBalanceTool {
    plugin: Arc<HrPlugin>,
}

impl GetLeaveBalanceTool {
    pub fn new(plugin: Arc<HrPlugin>) -> Self {
        Self { plugin }
    }
}

#[async_trait::async_trait]
impl Tool for GetLeaveBalanceTool {
    fn name(&self) -> &'static str {
        "get_leave_balance"
    }

    fn description(&self) -> &'static str {
        GET_LEAVE_BALANCE_DESCRIPTION
    }

    fn parameters(&self) -> Value {
        single_string_schema(
            "employee_name",
            "The name of the employee to check leave balance for",
        )
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let employee_name = require_string_arg(input, "employee_name")?;
        let result = self.plugin.lookup_balance(&employee_name).await;
        let success = result.is_ok();

        Ok(ToolOutput {
            success,
            data: json!(describe_balance(&employee_name, result)),
            error: None,
        })
    }
}

pub struct QueryPolicyTool {
    plugin: Arc<HrPlugin>,
}

impl QueryPolicyTool {
    pub fn new(plugin: Arc<HrPlugin>) -> Self {
        Self { plugin }
    }
}

#[async_trait::async_trait]
impl Tool for QueryPolicyTool {
    fn name(&self) -> &'static str {
        "query_policy"
    }

    fn description(&self) -> &'static str {
        QUERY_POLICY_DESCRIPTION
    }

    fn parameters(&self) -> Value {
        single_string_schema("query", "The policy question or topic to search for")
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let query = require_string_arg(input, "query")?;
        let result = self.plugin.search_policy(&query).await;
        let success = result.is_ok();

        Ok(ToolOutput {
            success,
            data: json!(describe_policy(&query, result)),
            error: None,
        })
    }
}

/// Registry with both HR functions under the `HRPlugin` name
pub fn create_hr_registry(plugin: Arc<HrPlugin>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(PLUGIN_NAME, Arc::new(GetLeaveBalanceTool::new(plugin.clone())));
    registry.register(PLUGIN_NAME, Arc::new(QueryPolicyTool::new(plugin)));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssistantError;
    use crate::test_support::sample_plugin;

    async fn registry() -> ToolRegistry {
        create_hr_registry(sample_plugin().await)
    }

    #[tokio::test]
    async fn test_registry_exposes_both_functions() {
        let registry = registry().await;
        assert_eq!(
            registry.list(),
            vec!["HRPlugin-get_leave_balance", "HRPlugin-query_policy"]
        );

        let definitions = registry.definitions();
        assert!(definitions[0].description.contains("remaining leave days"));
        assert_eq!(definitions[0].parameters["required"][0], "employee_name");
        assert_eq!(definitions[1].parameters["required"][0], "query");
    }

    #[tokio::test]
    async fn test_leave_balance_tool() {
        let registry = registry().await;
        let tool = registry.get("HRPlugin-get_leave_balance").unwrap();

        let output = tool
            .execute(&ToolInput {
                tool_name: "HRPlugin-get_leave_balance".to_string(),
                parameters: json!({"employee_name": "Bob"}),
            })
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(output.as_model_text(), "Bob has 8 days of annual leave remaining.");
    }

    #[tokio::test]
    async fn test_policy_tool_rejects_missing_query() {
        let registry = registry().await;
        let tool = registry.get("query_policy").unwrap();

        let err = tool
            .execute(&ToolInput {
                tool_name: "HRPlugin-query_policy".to_string(),
                parameters: json!({"topic": "sick leave"}),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AssistantError::InvalidToolInput(_)));
    }
}
