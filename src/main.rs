use std::sync::Arc;

use commute_intake::config::{IntakeConfig, ServerConfig};
use commute_intake::intake::{IntakeOrchestrator, IntakeRouteState, intake_routes};
use commute_intake::llm::{LlmConfig, create_provider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let llm_config = LlmConfig::from_env().map_err(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export INTAKE_LLM_API_KEY=sk-...");
        e
    })?;
    let intake_config = IntakeConfig::from_env()?;
    let server_config = ServerConfig::from_env()?;

    eprintln!("Commute Intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", llm_config.model);
    eprintln!("   Endpoint: {}", llm_config.api_url);
    eprintln!("   Timeout: {:?}", llm_config.timeout);
    eprintln!("   API: http://0.0.0.0:{}/chatbot\n", server_config.port);

    let llm = create_provider(&llm_config)?;
    let orchestrator = Arc::new(IntakeOrchestrator::new(llm, intake_config));
    let app = intake_routes(IntakeRouteState { orchestrator });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", server_config.port)).await?;
    tracing::info!(port = server_config.port, "Intake server started");
    axum::serve(listener, app).await?;

    Ok(())
}
