use hr_assistant::{api::start_server, app::build_runtime, config::Settings, logging};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_tracing();

    let settings = Settings::from_env()?;
    if settings.openai_api_key.is_none() {
        eprintln!("⚠️  OPENAI_API_KEY not set in .env");
        eprintln!("📌 See .env.example for setup instructions");
    }

    info!("🚀 HR Assistant - API Server");
    info!("📍 Port: {}", settings.api_port);

    let (plugin, assistant) = build_runtime(&settings).await?;

    info!("✅ Assistant initialized");
    info!("📡 Starting API server...");

    start_server(assistant, plugin, settings.api_port).await?;

    Ok(())
}
