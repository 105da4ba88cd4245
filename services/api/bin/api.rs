//! Main Entrypoint for the Pam Relay Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Building the session bridge and the optional Twilio client.
//! 3. Constructing the Axum router.
//! 4. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use pam_api::{
    config::Config, router::create_router, state::AppState, twilio::CallOriginator,
    twilio::TwilioClient, ws::OpenAiConnector,
};
use pam_core::SessionBridge;
use std::{net::SocketAddr, sync::Arc};
use tracing::{error, info, warn};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install Ctrl+C handler.");
        return;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Shared Services ---
    let connector = Arc::new(OpenAiConnector::from_config(&config));
    let bridge = Arc::new(SessionBridge::new(
        connector,
        Arc::new(config.session_config()),
    ));

    let call_originator = config
        .twilio
        .as_ref()
        .map(|creds| Arc::new(TwilioClient::new(creds)) as Arc<dyn CallOriginator>);
    if call_originator.is_none() {
        warn!("Twilio credentials not set. Outbound calls are disabled.");
    }

    info!(
        model = %config.realtime_model,
        voice = %config.voice,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let bind_address = config.bind_address;
    let app_state = Arc::new(AppState {
        config: Arc::new(config),
        bridge,
        call_originator,
    });

    // --- 4. Create Router and Start Server ---
    let app = create_router(app_state);
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
