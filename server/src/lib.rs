//! Haraj HTTP API
//!
//! Thin shell that wires configuration, extraction rules and the scrape
//! orchestrator behind an axum router. Business logic lives in `crates/`.

mod error;
mod handlers;
mod state;

pub use error::{ApiError, ErrorBody};
pub use handlers::{split_urls, ScrapeResponse};
pub use state::AppState;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use haraj_core::AppConfig;
use haraj_rules::RulesLoader;
use haraj_scraper::ScrapeOrchestrator;
use tracing::info;

/// Build the router with every API route.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/scrape-data", get(handlers::scrape_data))
        .route("/export-excel", get(handlers::export_excel))
        .route("/export-csv", get(handlers::export_csv))
        .route("/scrape-multi", get(handlers::scrape_multi))
        .route("/export-excel-multi", get(handlers::export_excel_multi))
        .route("/export-csv-multi", get(handlers::export_csv_multi))
        .route("/scrape-all", get(handlers::scrape_all))
        .route("/export-excel-all", get(handlers::export_excel_all))
        .route("/export-csv-all", get(handlers::export_csv_all));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/scraper", api)
        .with_state(state)
}

/// Initialize tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,haraj=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

/// Load configuration and rules, then serve the API until Ctrl-C.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Haraj harvester v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_with_env().context("failed to load configuration")?;
    let rules = RulesLoader::load(config.general.rules_path.as_deref())
        .context("failed to load extraction rules")?;
    info!("Using extraction rules '{}'", rules.id());

    let orchestrator = ScrapeOrchestrator::from_config(&config, &rules)
        .context("failed to build scrape pipeline")?;
    let cancel = orchestrator.cancellation_token().clone();

    let app = create_router(AppState::new(orchestrator));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for shutdown signal: {}", e);
            }
            info!("Shutting down, cancelling in-flight scrapes");
            cancel.cancel();
        })
        .await?;

    Ok(())
}
