use hr_assistant::{app::build_runtime, config::Settings, interactive, logging};
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_tracing();

    let settings = Settings::from_env()?;
    info!("🚀 HR Assistant starting");

    let (_plugin, assistant) = build_runtime(&settings).await?;

    println!("=== HR Assistant with AI function routing ===\n");

    // Example 1: leave balance question, routed to get_leave_balance
    println!("1. Testing leave balance query:");
    let result = assistant
        .rag_query("How many leave days does Alice have left?", None)
        .await;
    println!("Result: {}\n", result);

    // Example 2: policy question, routed to query_policy
    println!("2. Testing policy query:");
    let result = assistant
        .rag_query("How many annual leave days are employees entitled to?", None)
        .await;
    println!("Result: {}\n", result);

    println!("3. Starting interactive mode...");
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    interactive::run_until_interrupted(&assistant, stdin, stdout, tokio::signal::ctrl_c())
        .await?;

    Ok(())
}
