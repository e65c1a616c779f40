//! # Forum Chat Server
//!
//! Application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Database connection pool and migrations
//! - HTTP/WebSocket server

use anyhow::Result;
use tracing::info;

use forum_chat::config::Settings;
use forum_chat::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    forum_chat::telemetry::init_tracing();

    info!("Starting Forum Chat Server...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    forum_chat::presentation::http::handlers::health::init_server_start();

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
