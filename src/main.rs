// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::inference_trigger::InferenceTriggerController;
use crate::application::view_synchronizer::ViewSynchronizer;
use crate::infrastructure::config::{load_app_config, DEFAULT_CONFIG_PATH};
use crate::infrastructure::csv_data_manager::CsvDataManager;
use crate::infrastructure::inference_client::HttpInferenceClient;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config_path =
        std::env::var("DASHBOARD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = load_app_config(&config_path)?;
    let default_lookback = config.ui.default_lookback()?;

    // Collaborators (infrastructure layer)
    let data_manager = Arc::new(CsvDataManager::new(
        config.data.production_path.clone(),
        config.data.prediction_path.clone(),
    ));
    let inference_client = HttpInferenceClient::new(&config.inference_api)?;
    tracing::info!("Inference endpoint: {}", inference_client.url());

    // Services (application layer)
    let dashboard_service = DashboardService::new(
        ViewSynchronizer::new(data_manager, default_lookback),
        InferenceTriggerController::new(Arc::new(inference_client)),
        config.server.session_idle_timeout(),
    );

    let state = Arc::new(AppState { dashboard_service });
    let router = build_router(state);

    tracing::info!("Starting bike-dashboard on {}", config.server.bind);
    axum::serve(tokio::net::TcpListener::bind(config.server.bind).await?, router).await?;

    Ok(())
}
