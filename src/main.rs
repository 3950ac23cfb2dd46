//! PagerDuty Prometheus Exporter Binary

use pd_exporter::server::{self, AppState};
use pd_exporter::{Config, PagerDutyClient, Result, ScrapeCollector};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing
    initialize_tracing();

    info!("Starting PagerDuty exporter v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_args();

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    info!(
        "Exporter configuration - API: {}, Listen: {}, Path: {}, Collectors: {:?}",
        config.api_url,
        config.listen_address,
        config.metrics_path,
        config.collectors
    );

    let client = PagerDutyClient::new(config.api_url.clone(), &config.auth_token)?;
    let collector = ScrapeCollector::new(Arc::new(client), &config)?;

    let state = AppState {
        collector,
        metrics_path: config.metrics_path.clone(),
    };

    if let Err(e) = server::run(&config.listen_address, state).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize structured logging
fn initialize_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
