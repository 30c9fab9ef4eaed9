//! HR assistant kernel - lets the model route questions to HR functions
//!
//! QUESTION → MODEL → (CALL FUNCTIONS → MODEL)* → ANSWER
//!
//! There is no keyword routing here: the model reads the function
//! descriptions and decides which ones, if any, to call.

use crate::config::ExecutionSettings;
use crate::error::AssistantError;
use crate::llm::ChatModel;
use crate::memory::ChatHistory;
use crate::models::{
    AssistantReply, ExecutionStatus, FunctionInvocation, ToolCall, ToolInput,
};
use crate::tools::ToolRegistry;
use crate::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const SYSTEM_PROMPT: &str = "You are an HR assistant that helps employees with leave-related questions and HR policies. \
ALWAYS use the available functions to get accurate, up-to-date information. \
For leave balance questions, use get_leave_balance with the employee name. \
For policy questions, use query_policy. \
Extract employee names from questions when needed. \
Provide helpful, accurate responses based on the function results. \
If the information is not available, clearly state that.";

pub const FALLBACK_ANSWER: &str = "Sorry, I couldn't process your request.";

/// Main assistant that coordinates the model and the HR functions
pub struct HrAssistant {
    model: Arc<dyn ChatModel>,
    registry: ToolRegistry,
    settings: ExecutionSettings,
}

impl HrAssistant {
    pub fn new(
        model: Arc<dyn ChatModel>,
        registry: ToolRegistry,
        settings: ExecutionSettings,
    ) -> Self {
        Self {
            model,
            registry,
            settings,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Answer a question, letting the model pick which functions to run
    pub async fn ask(&self, query: &str) -> Result<AssistantReply> {
        let start_time = Instant::now();
        let definitions = self.registry.definitions();
        let mut history = ChatHistory::with_system_message(SYSTEM_PROMPT);
        history.add_user_message(query);

        info!(
            conversation_id = %history.conversation_id,
            query = %query,
            functions = definitions.len(),
            "Assistant: handling question"
        );

        let mut invocations = Vec::new();
        let mut rounds = 0u32;

        loop {
            let turn = self
                .model
                .complete(history.messages(), &definitions, &self.settings)
                .await?;

            if turn.tool_calls.is_empty() {
                debug!(transcript = %history.get_formatted_transcript(), "Final transcript");
                info!(
                    conversation_id = %history.conversation_id,
                    invocations = invocations.len(),
                    tool_results = history.tool_results().count(),
                    messages = history.message_count(),
                    estimated_tokens = history.total_tokens(),
                    elapsed_ms = start_time.elapsed().as_millis() as u64,
                    "Assistant: answer ready"
                );

                return Ok(AssistantReply {
                    answer: turn.content.unwrap_or_else(|| FALLBACK_ANSWER.to_string()),
                    invocations,
                });
            }

            if rounds >= self.settings.max_tool_rounds {
                return Err(AssistantError::MaxToolRoundsExceeded(format!(
                    "Model still requesting functions after {} rounds",
                    self.settings.max_tool_rounds
                )));
            }
            rounds += 1;

            debug!(
                round = rounds,
                calls = turn.tool_calls.len(),
                "Model selected functions"
            );

            history.add_assistant_message(turn.content.clone(), turn.tool_calls.clone());

            for call in &turn.tool_calls {
                let invocation = self.invoke(call).await;
                history.add_tool_result(call.id.clone(), invocation.result.clone());
                invocations.push(invocation);
            }
        }
    }

    /// Run one requested function; failures are reported back as text
    async fn invoke(&self, call: &ToolCall) -> FunctionInvocation {
        let start = Instant::now();

        let (status, result) = match self.registry.get(&call.name) {
            Some(tool) => {
                let input = ToolInput {
                    tool_name: call.name.clone(),
                    parameters: call.arguments.clone(),
                };

                match tool.execute(&input).await {
                    Ok(output) => {
                        let status = if output.success {
                            ExecutionStatus::Success
                        } else {
                            ExecutionStatus::Failed
                        };
                        (status, output.as_model_text())
                    }
                    Err(e) => {
                        warn!(function = %call.name, error = %e, "Function execution failed");
                        (ExecutionStatus::Failed, format!("Error: {}", e))
                    }
                }
            }
            None => {
                warn!(function = %call.name, "Model requested unknown function");
                (
                    ExecutionStatus::Skipped,
                    format!("Error: function '{}' is not available.", call.name),
                )
            }
        };

        let execution_time_ms = start.elapsed().as_millis() as u64;

        info!(
            function = %call.name,
            arguments = %call.arguments,
            status = ?status,
            execution_time_ms,
            "Function invoked"
        );

        FunctionInvocation {
            invocation_id: Uuid::new_v4(),
            call_id: call.id.clone(),
            function_name: call.name.clone(),
            arguments: call.arguments.clone(),
            result,
            status,
            execution_time_ms,
            created_at: Utc::now(),
        }
    }

    /// Answer text, with failures folded into the reply
    pub async fn rag_query_semantic(&self, query: &str) -> String {
        match self.ask(query).await {
            Ok(reply) => reply.answer,
            Err(e) => {
                warn!(error = %e, "Assistant failed to answer");
                format!("Error processing request: {}", e)
            }
        }
    }

    /// Like `rag_query_semantic`, naming the employee when the question doesn't
    pub async fn rag_query(&self, query: &str, employee_name: Option<&str>) -> String {
        self.rag_query_semantic(&enhance_query(query, employee_name))
            .await
    }
}

/// Append the employee name unless the query already mentions it
pub fn enhance_query(query: &str, employee_name: Option<&str>) -> String {
    match employee_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) if !query.to_lowercase().contains(&name.to_lowercase()) => {
            format!("{} for employee {}", query, name)
        }
        _ => query.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ModelTurn;
    use crate::models::ChatRole;
    use crate::policy::DEFAULT_POLICY_TEXT;
    use crate::test_support::{answer, assistant_with, call, ScriptedModel};
    use serde_json::json;

    #[tokio::test]
    async fn test_balance_question_runs_selected_function() {
        let model = Arc::new(ScriptedModel::new(vec![
            call("call_1", "HRPlugin-get_leave_balance", json!({"employee_name": "Alice"})),
            answer("Alice has 15 days of annual leave remaining."),
        ]));
        let assistant = assistant_with(model.clone()).await;

        let reply = assistant
            .ask("How many leave days does Alice have left?")
            .await
            .unwrap();

        assert_eq!(reply.answer, "Alice has 15 days of annual leave remaining.");
        assert_eq!(reply.selected_functions(), vec!["HRPlugin-get_leave_balance"]);
        assert_eq!(reply.invocations[0].status, ExecutionStatus::Success);

        let requests = model.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0][0].role, ChatRole::System);
        assert_eq!(requests[0][0].content.as_deref(), Some(SYSTEM_PROMPT));

        let second = &requests[1];
        assert_eq!(second.len(), 4);
        assert_eq!(second[2].role, ChatRole::Assistant);
        assert_eq!(second[3].role, ChatRole::Tool);
        assert_eq!(second[3].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(
            second[3].content.as_deref(),
            Some("Alice has 15 days of annual leave remaining.")
        );
    }

    #[tokio::test]
    async fn test_policy_question_feeds_document_back() {
        let model = Arc::new(ScriptedModel::new(vec![
            call(
                "call_1",
                "HRPlugin-query_policy",
                json!({"query": "annual leave entitlement"}),
            ),
            answer("Employees are entitled to 20 days of annual leave per year."),
        ]));
        let assistant = assistant_with(model.clone()).await;

        let reply = assistant
            .ask("How many annual leave days are employees entitled to?")
            .await
            .unwrap();

        assert_eq!(reply.invocations[0].result, DEFAULT_POLICY_TEXT);
        assert_eq!(reply.selected_functions(), vec!["HRPlugin-query_policy"]);
    }

    #[tokio::test]
    async fn test_multiple_calls_in_one_turn_run_in_order() {
        let model = Arc::new(ScriptedModel::new(vec![
            ModelTurn {
                content: None,
                tool_calls: vec![
                    ToolCall {
                        id: "a".to_string(),
                        name: "HRPlugin-get_leave_balance".to_string(),
                        arguments: json!({"employee_name": "Bob"}),
                    },
                    ToolCall {
                        id: "b".to_string(),
                        name: "HRPlugin-query_policy".to_string(),
                        arguments: json!({"query": "annual leave"}),
                    },
                ],
                finish_reason: Some("tool_calls".to_string()),
            },
            answer("Bob has 8 of his 20 days left."),
        ]));
        let assistant = assistant_with(model.clone()).await;

        let reply = assistant.ask("How does Bob compare to the policy?").await.unwrap();
        assert_eq!(
            reply.selected_functions(),
            vec!["HRPlugin-get_leave_balance", "HRPlugin-query_policy"]
        );

        let tool_ids: Vec<_> = model.requests()[1]
            .iter()
            .filter_map(|m| m.tool_call_id.clone())
            .collect();
        assert_eq!(tool_ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_unknown_function_is_reported_to_model() {
        let model = Arc::new(ScriptedModel::new(vec![
            call("call_1", "HRPlugin-delete_employee", json!({})),
            answer("I can't do that."),
        ]));
        let assistant = assistant_with(model.clone()).await;

        let reply = assistant.ask("Delete Bob").await.unwrap();
        assert_eq!(reply.invocations[0].status, ExecutionStatus::Skipped);
        assert!(reply.invocations[0].result.contains("not available"));
        assert_eq!(reply.answer, "I can't do that.");
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_reported_to_model() {
        let model = Arc::new(ScriptedModel::new(vec![
            call("call_1", "HRPlugin-get_leave_balance", json!({})),
            answer("Which employee do you mean?"),
        ]));
        let assistant = assistant_with(model).await;

        let reply = assistant.ask("How many days are left?").await.unwrap();
        assert_eq!(reply.invocations[0].status, ExecutionStatus::Failed);
        assert!(reply.invocations[0].result.contains("employee_name"));
    }

    #[tokio::test]
    async fn test_empty_answer_falls_back() {
        let model = Arc::new(ScriptedModel::new(vec![ModelTurn::default()]));
        let assistant = assistant_with(model).await;

        let reply = assistant.ask("hello").await.unwrap();
        assert_eq!(reply.answer, FALLBACK_ANSWER);
        assert!(reply.invocations.is_empty());
    }

    #[tokio::test]
    async fn test_tool_rounds_are_bounded() {
        let turns = (0..10)
            .map(|i| call(&format!("call_{}", i), "HRPlugin-query_policy", json!({"query": "leave"})))
            .collect();
        let model = Arc::new(ScriptedModel::new(turns));
        let assistant = assistant_with(model.clone()).await;

        let err = assistant.ask("loop forever").await.unwrap_err();
        assert!(matches!(err, AssistantError::MaxToolRoundsExceeded(_)));
        assert_eq!(model.requests().len(), 6);
    }

    #[tokio::test]
    async fn test_rag_query_semantic_folds_errors() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let assistant = assistant_with(model).await;

        let answer = assistant.rag_query_semantic("anything").await;
        assert!(answer.starts_with("Error processing request:"));
        assert!(answer.contains("script exhausted"));
    }

    #[tokio::test]
    async fn test_rag_query_names_the_employee() {
        let model = Arc::new(ScriptedModel::new(vec![answer("ok")]));
        let assistant = assistant_with(model.clone()).await;

        assistant
            .rag_query("How many leave days are left?", Some("Diana"))
            .await;

        let sent = &model.requests()[0][1];
        assert_eq!(
            sent.content.as_deref(),
            Some("How many leave days are left? for employee Diana")
        );
    }

    #[test]
    fn test_enhance_query() {
        assert_eq!(
            enhance_query("What's my balance?", Some("Bob")),
            "What's my balance? for employee Bob"
        );
        assert_eq!(
            enhance_query("What's bob's balance?", Some("Bob")),
            "What's bob's balance?"
        );
        assert_eq!(enhance_query("Leave policy?", None), "Leave policy?");
        assert_eq!(enhance_query("Leave policy?", Some("  ")), "Leave policy?");
    }
}
