use financial_document_analyzer::{
    agent::Crew,
    api::{start_server, ApiState},
    config::AppConfig,
    execution::DocumentProcessor,
    llm::build_language_model,
    state::build_store,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    info!("🚀 Financial Document Analyzer - API Server");
    info!("📍 Port: {}", config.port);
    info!(
        provider = ?config.llm_provider,
        model = %config.llm_model,
        upload_dir = %config.upload_dir.display(),
        "Configuration loaded"
    );

    if config.openai_api_key.is_empty() && config.gemini_api_key.is_empty() {
        warn!("⚠️  No OPENAI_API_KEY or GEMINI_API_KEY set; analyses will fail unless LLM_PROVIDER=mock");
    }

    // Create components
    let llm = build_language_model(&config)?;
    let crew = Arc::new(Crew::financial_crew(llm)?);
    let store = build_store(&config);
    let processor = DocumentProcessor::new(crew, store);

    let state = ApiState {
        processor,
        upload_dir: config.upload_dir.clone(),
    };

    info!("✅ Crew initialized");
    info!("📡 Starting API server...");

    start_server(state, &config.host, config.port, config.max_upload_bytes).await?;

    Ok(())
}
