//! # Community Store
//!
//! Entry point that initializes:
//! - Configuration loading
//! - Tracing/logging subsystem
//! - Primary store (PostgreSQL or in-memory) and search mirror
//! - Backlog sweeper and the operational HTTP server

use anyhow::Result;
use tracing::info;

use community_store::config::Settings;
use community_store::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment and config files
    let settings = Settings::load()?;

    // Initialize tracing subscriber for structured logging
    community_store::telemetry::init_tracing(settings.telemetry.json);

    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        backend = ?settings.store.backend,
        search = settings.search.enabled,
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
