use hr_assistant::{
    app::build_runtime,
    config::Settings,
    interactive, logging,
    routing::{run_routing_check, CheckMode, QUERY_PAUSE},
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_tracing();

    let settings = Settings::from_env()?;

    if let Err(e) = settings.require_api_key() {
        eprintln!("Error: {}", e);
        return Err(e.into());
    }

    if settings.database_url.is_none() {
        warn!("DATABASE_URL not found in environment variables");
        println!("Warning: DATABASE_URL not set, using sample leave balances.");
        println!("Continuing with test anyway...\n");
    }

    let (_plugin, assistant) = build_runtime(&settings).await?;

    let mut stdout = tokio::io::stdout();
    let mut stdin = BufReader::new(tokio::io::stdin());

    stdout
        .write_all(
            b"Select test mode:\n\
1. Automated test (runs predefined queries)\n\
2. Interactive test (manual queries)\n\
3. Both\n\
Enter your choice (1-3): ",
        )
        .await?;
    stdout.flush().await?;

    let mut choice = String::new();
    stdin.read_line(&mut choice).await?;

    let mode = CheckMode::from_choice(&choice).unwrap_or_else(|| {
        println!("Invalid choice. Running automated test...");
        CheckMode::Automated
    });

    if mode.runs_automated() {
        run_routing_check(&assistant, &mut stdout, QUERY_PAUSE).await?;
    }

    if mode.runs_interactive() {
        println!("\n=== Interactive Test Mode ===");
        println!("Try asking different questions to see the routing in action:");
        println!("- 'How many days does Alice have?'");
        println!("- 'What's the leave policy?'");
        println!("- 'Check Bob's vacation balance'\n");
        interactive::run_until_interrupted(&assistant, stdin, stdout, tokio::signal::ctrl_c())
            .await?;
    }

    Ok(())
}
