//! Scripted routing check
//!
//! Runs a fixed mix of balance and policy questions through the assistant and
//! reports which functions the model chose for each one.

use crate::agent::HrAssistant;
use crate::Result;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

pub const ROUTING_QUERIES: [&str; 8] = [
    "How many leave days does Alice have left?",
    "What's Bob's current vacation balance?",
    "How many annual leave days are employees entitled to?",
    "What is the company policy on sick leave?",
    "Can you check Diana's remaining time off?",
    "What are the rules for taking consecutive leave days?",
    "How much vacation time does Charlie have available?",
    "What's the policy for emergency leave?",
];

/// Pause between questions to stay clear of rate limits
pub const QUERY_PAUSE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    Automated,
    Interactive,
    Both,
}

impl CheckMode {
    /// Menu choice; `None` for anything other than 1, 2 or 3
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(CheckMode::Automated),
            "2" => Some(CheckMode::Interactive),
            "3" => Some(CheckMode::Both),
            _ => None,
        }
    }

    pub fn runs_automated(&self) -> bool {
        matches!(self, CheckMode::Automated | CheckMode::Both)
    }

    pub fn runs_interactive(&self) -> bool {
        matches!(self, CheckMode::Interactive | CheckMode::Both)
    }
}

/// Ask every routing question in order. Returns how many were answered.
pub async fn run_routing_check<W>(
    assistant: &HrAssistant,
    output: &mut W,
    pause: Duration,
) -> Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let rule = "=".repeat(60);
    let mut answered = 0;

    output
        .write_all(b"=== HR Assistant Routing Check ===\n\n")
        .await?;

    for (i, query) in ROUTING_QUERIES.iter().enumerate() {
        output
            .write_all(format!("{}. Query: '{}'\n", i + 1, query).as_bytes())
            .await?;

        match assistant.ask(query).await {
            Ok(reply) => {
                let selected = reply.selected_functions();
                let functions = if selected.is_empty() {
                    "(none)".to_string()
                } else {
                    selected.join(", ")
                };
                output
                    .write_all(
                        format!(
                            "   Functions: {}\n   Response: {}\n",
                            functions, reply.answer
                        )
                        .as_bytes(),
                    )
                    .await?;
                answered += 1;
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Routing check query failed");
                output
                    .write_all(format!("   Error: {}\n", e).as_bytes())
                    .await?;
            }
        }

        output.write_all(format!("   {}\n\n", rule).as_bytes()).await?;

        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    output
        .write_all(
            format!(
                "Routing check completed: {}/{} questions answered.\n",
                answered,
                ROUTING_QUERIES.len()
            )
            .as_bytes(),
        )
        .await?;
    output.flush().await?;

    Ok(answered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{answer, assistant_with, call, ScriptedModel};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_menu_choices() {
        assert_eq!(CheckMode::from_choice("1"), Some(CheckMode::Automated));
        assert_eq!(CheckMode::from_choice(" 2 "), Some(CheckMode::Interactive));
        assert_eq!(CheckMode::from_choice("3"), Some(CheckMode::Both));
        assert_eq!(CheckMode::from_choice("4"), None);
        assert!(CheckMode::Both.runs_automated() && CheckMode::Both.runs_interactive());
        assert!(!CheckMode::Interactive.runs_automated());
    }

    #[tokio::test]
    async fn test_check_reports_selected_functions() {
        let mut turns = Vec::new();
        for (i, query) in ROUTING_QUERIES.iter().enumerate() {
            let id = format!("call_{}", i);
            if query.contains("polic") || query.contains("entitled") || query.contains("rules") {
                turns.push(call(&id, "HRPlugin-query_policy", json!({"query": query})));
            } else {
                turns.push(call(&id, "HRPlugin-get_leave_balance", json!({"employee_name": "Alice"})));
            }
            turns.push(answer("done"));
        }
        let model = Arc::new(ScriptedModel::new(turns));
        let assistant = assistant_with(model.clone()).await;

        let mut output = Vec::new();
        let answered = run_routing_check(&assistant, &mut output, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(answered, 8);

        let report = String::from_utf8(output).unwrap();
        assert!(report.contains("1. Query: 'How many leave days does Alice have left?'"));
        assert_eq!(report.matches("Functions: HRPlugin-get_leave_balance").count(), 4);
        assert_eq!(report.matches("Functions: HRPlugin-query_policy").count(), 4);
        assert!(report.contains("8/8 questions answered"));
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_check() {
        let model = Arc::new(ScriptedModel::new(vec![answer("only one")]));
        let assistant = assistant_with(model).await;

        let mut output = Vec::new();
        let answered = run_routing_check(&assistant, &mut output, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(answered, 1);

        let report = String::from_utf8(output).unwrap();
        assert!(report.contains("Functions: (none)"));
        assert_eq!(report.matches("Error: LLM error").count(), 7);
    }
}
