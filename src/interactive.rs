//! Interactive terminal session with the HR assistant

use crate::agent::HrAssistant;
use crate::Result;
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

const EXIT_WORDS: &[&str] = &["quit", "exit", "bye", "goodbye"];

pub const GREETING: &str = "Welcome to the HR Assistant!\n\
Ask me about leave balances, HR policies, or company procedures.\n\
Type 'quit' or 'exit' to stop.\n\n";

pub const FAREWELL: &str = "Thank you for using the HR Assistant. Have a great day!";
pub const INTERRUPTED: &str = "Goodbye! Thanks for using the HR Assistant.";

pub fn is_exit_command(input: &str) -> bool {
    let lowered = input.trim().to_lowercase();
    EXIT_WORDS.contains(&lowered.as_str())
}

/// Read questions line by line until an exit word or end of input.
pub async fn run_interactive<R, W>(assistant: &HrAssistant, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(GREETING.as_bytes()).await?;

    let mut lines = input.lines();
    let rule = "=".repeat(50);

    loop {
        output.write_all(b"You: ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            output
                .write_all(format!("\n\n{}\n", INTERRUPTED).as_bytes())
                .await?;
            break;
        };

        let user_input = line.trim();

        if is_exit_command(user_input) {
            output.write_all(format!("{}\n", FAREWELL).as_bytes()).await?;
            break;
        }

        if user_input.is_empty() {
            output
                .write_all(b"Please enter a question or type 'quit' to exit.\n")
                .await?;
            continue;
        }

        debug!(question = %user_input, "Interactive question");

        output
            .write_all(format!("\n{}\nProcessing: {}\n{}\n", rule, user_input, rule).as_bytes())
            .await?;

        let response = assistant.rag_query_semantic(user_input).await;
        output
            .write_all(format!("HR Assistant: {}\n\n", response).as_bytes())
            .await?;
    }

    output.flush().await?;
    Ok(())
}

/// Run the session until it ends or `interrupt` completes, whichever is first
pub async fn run_until_interrupted<R, W, F>(
    assistant: &HrAssistant,
    input: R,
    mut output: W,
    interrupt: F,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    F: Future,
{
    let interrupted = tokio::select! {
        result = run_interactive(assistant, input, &mut output) => {
            result?;
            false
        }
        _ = interrupt => true,
    };

    if interrupted {
        debug!("Interactive session interrupted");
        output
            .write_all(format!("\n\n{}\n", INTERRUPTED).as_bytes())
            .await?;
        output.flush().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{answer, assistant_with, call, ScriptedModel};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_exit_words() {
        assert!(is_exit_command("quit"));
        assert!(is_exit_command("  Goodbye "));
        assert!(is_exit_command("EXIT"));
        assert!(!is_exit_command("quit smoking policy"));
        assert!(!is_exit_command(""));
    }

    #[tokio::test]
    async fn test_session_answers_until_quit() {
        let model = Arc::new(ScriptedModel::new(vec![
            call("call_1", "HRPlugin-get_leave_balance", json!({"employee_name": "Diana"})),
            answer("Diana has 5 days of annual leave remaining."),
        ]));
        let assistant = assistant_with(model.clone()).await;

        let input: &[u8] = b"\nCan you check Diana's remaining time off?\nquit\nnever read\n";
        let mut output = Vec::new();
        run_interactive(&assistant, input, &mut output).await.unwrap();

        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.starts_with("Welcome to the HR Assistant!"));
        assert!(transcript.contains("Please enter a question or type 'quit' to exit."));
        assert!(transcript.contains("Processing: Can you check Diana's remaining time off?"));
        assert!(transcript.contains("HR Assistant: Diana has 5 days of annual leave remaining."));
        assert!(transcript.trim_end().ends_with(FAREWELL));
        assert_eq!(model.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_end_of_input_says_goodbye() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let assistant = assistant_with(model.clone()).await;

        let input: &[u8] = b"";
        let mut output = Vec::new();
        run_interactive(&assistant, input, &mut output).await.unwrap();

        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.trim_end().ends_with(INTERRUPTED));
        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn test_interrupt_ends_a_waiting_session() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let assistant = assistant_with(model.clone()).await;

        let (_keyboard, terminal) = tokio::io::duplex(64);
        let mut output = Vec::new();
        run_until_interrupted(
            &assistant,
            tokio::io::BufReader::new(terminal),
            &mut output,
            async {},
        )
        .await
        .unwrap();

        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.trim_end().ends_with(INTERRUPTED));
        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn test_finished_session_is_not_interrupted() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let assistant = assistant_with(model).await;

        let input: &[u8] = b"bye\n";
        let mut output = Vec::new();
        run_until_interrupted(&assistant, input, &mut output, std::future::pending::<()>())
            .await
            .unwrap();

        let transcript = String::from_utf8(output).unwrap();
        assert!(transcript.trim_end().ends_with(FAREWELL));
        assert!(!transcript.contains(INTERRUPTED));
    }
}
