use financial_document_analyzer::{
    agent::Crew,
    config::AppConfig,
    llm::build_language_model,
    models::{CrewInputs, DEFAULT_QUERY},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(file_path) = args.next() else {
        eprintln!("Usage: analyze <document.pdf> [query...]");
        std::process::exit(2);
    };

    let query = args.collect::<Vec<_>>().join(" ");
    let query = if query.trim().is_empty() {
        DEFAULT_QUERY.to_string()
    } else {
        query.trim().to_string()
    };

    let config = AppConfig::from_env()?;
    let crew = Crew::financial_crew(build_language_model(&config)?)?;

    info!(file_path = %file_path, query = %query, "Running crew");

    let output = crew.kickoff(&CrewInputs { query, file_path }).await?;

    println!("\n=== ANALYSIS RESULT ===");
    for (i, task) in output.tasks_output.iter().enumerate() {
        println!(
            "\n--- {}: {} ({}, {} ms) ---",
            i + 1,
            task.task,
            task.agent_role,
            task.execution_time_ms
        );
        println!("{}", task.raw);
    }

    Ok(())
}
