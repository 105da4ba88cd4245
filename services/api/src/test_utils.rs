//! Shared fixtures for handler and WebSocket tests.

use crate::{config::Config, state::AppState, twilio::CallOriginator};
use async_trait::async_trait;
use pam_core::{Connection, RealtimeConnector, RelayError, SessionBridge};
use secrecy::SecretString;
use std::{future::IntoFuture, sync::Arc, sync::Mutex, time::Duration};
use tracing::Level;

pub(crate) async fn within<F: IntoFuture>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("timed out")
}

pub(crate) fn test_config(public_host: Option<&str>) -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        openai_api_key: SecretString::from("sk-test"),
        realtime_url: "wss://realtime.invalid/v1/realtime".to_string(),
        realtime_model: "test-model".to_string(),
        voice: "alloy".to_string(),
        instructions: "Be helpful.".to_string(),
        temperature: 0.8,
        twilio: None,
        public_host: public_host.map(str::to_string),
        log_level: Level::INFO,
    }
}

pub(crate) fn app_state(
    config: Config,
    connector: Arc<dyn RealtimeConnector>,
    call_originator: Option<Arc<dyn CallOriginator>>,
) -> Arc<AppState> {
    let bridge = SessionBridge::new(connector, Arc::new(config.session_config()));
    Arc::new(AppState {
        config: Arc::new(config),
        bridge: Arc::new(bridge),
        call_originator,
    })
}

/// A connector whose endpoint always rejects the handshake.
pub(crate) struct RefusingConnector;

#[async_trait]
impl RealtimeConnector for RefusingConnector {
    async fn connect(&self) -> Result<Connection, RelayError> {
        Err(RelayError::connect("HTTP error: 401 Unauthorized"))
    }
}

/// Hands out a single pre-built in-memory connection.
pub(crate) struct MemoryConnector {
    connection: Mutex<Option<Connection>>,
}

impl MemoryConnector {
    pub(crate) fn new(connection: Connection) -> Self {
        Self {
            connection: Mutex::new(Some(connection)),
        }
    }
}

#[async_trait]
impl RealtimeConnector for MemoryConnector {
    async fn connect(&self) -> Result<Connection, RelayError> {
        let connection = self.connection.lock().unwrap().take();
        connection.ok_or_else(|| RelayError::connect("connection already used"))
    }
}
