// Main entry point for the scrape relay server

use anyhow::{Context, Result};
use scrape_core::{
    domains::scraping::SlotPolicy,
    kernel::{ServerDeps, WebhookClient},
    server::build_app,
    Config,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,scrape_core=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting email scrape relay");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        worker = %config.worker.program(),
        args = ?config.worker.arguments(),
        worker_timeout = ?config.worker.timeout(),
        isolation = config.slot_policy.label(),
        "Configuration loaded"
    );

    if let SlotPolicy::PerJob { root, .. } = &config.slot_policy {
        tokio::fs::create_dir_all(root)
            .await
            .with_context(|| format!("Failed to create jobs directory {}", root.display()))?;
    } else {
        tracing::warn!("Shared job slot in use: concurrent requests race on config.json");
    }

    // Build application
    let webhook = WebhookClient::new(config.webhook_timeout)?;
    let deps = ServerDeps::production(config.worker.clone(), webhook);
    let app = build_app(&config, deps);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Server is running on port {}", config.port);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
