use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use label_insight::classification::ClassificationTables;
use label_insight::config::AppConfig;
use label_insight::errors::error_logging;
use label_insight::lookup::OpenFoodFactsClient;
use label_insight::observability;
use label_insight::ocr::TesseractEngine;
use label_insight::pipeline::LabelAnalyzer;
use label_insight::server::{run_api_server, AppState};

/// Validate the full configuration at startup
fn validate_configuration(config: &AppConfig) -> Result<()> {
    if let Err(e) = config.validate() {
        error_logging::log_config_error(&e, "app_config", "startup_validation");
        return Err(anyhow::anyhow!(
            "Configuration validation failed: {}. Please check your environment variables and classification tables file.",
            e
        ));
    }

    info!("Configuration validated successfully");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    // Load and validate configuration early
    let config = AppConfig::from_env()?;

    // Initialize observability (tracing, metrics, health endpoints)
    observability::init_observability(config.server.metrics_port).await?;

    validate_configuration(&config)?;
    info!("{}", config.summary());

    // Shared immutable classification tables, loaded once per process
    let tables: Arc<ClassificationTables> = Arc::new(config.tables.clone());

    // Build the pipeline and its collaborators
    let analyzer = LabelAnalyzer::new(Arc::clone(&tables));
    let lookup = OpenFoodFactsClient::new(config.lookup.clone())?;
    let ocr_engine = TesseractEngine::new(config.ocr.clone());

    let state = Arc::new(AppState {
        analyzer,
        lookup: Arc::new(lookup),
        ocr_engine: Arc::new(ocr_engine),
    });

    info!("Starting label analysis API");
    run_api_server(state, config.server.api_port).await
}
