use smart_math_tutor::{
    agent::Orchestrator,
    config::TutorConfig,
    gemini::GeminiClient,
    output::StdoutSink,
    symbolic::MathEngine,
};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv::dotenv().ok();

    // Initialize tracing on stderr; stdout carries the transcript
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = TutorConfig::from_env()?;

    if config.api_key.is_empty() {
        warn!("GEMINI_API_KEY not set; every verification will report an API error");
    }

    info!(
        model = %config.model,
        marker = %config.termination_marker,
        max_rounds = ?config.max_rounds,
        "Smart Math Tutor starting"
    );

    let orchestrator = Orchestrator::new(
        Arc::new(MathEngine::new()),
        Arc::new(GeminiClient::from_config(&config)),
        Arc::new(StdoutSink),
        &config,
    );

    let summary = orchestrator
        .run_session(BufReader::new(tokio::io::stdin()))
        .await?;

    info!(
        problems = summary.problems,
        verified = summary.verified,
        "Session closed"
    );

    Ok(())
}
