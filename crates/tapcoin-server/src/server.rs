//! Game server lifecycle.
//!
//! [`start_server`] binds the listener, starts the idle-view sweep, and
//! serves the page, REST, and `WebSocket` routes until `Ctrl-C`. Open
//! views are left to their in-flight writes when the process exits.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::{AppState, spawn_view_reaper};

/// Where to listen and how long unwatched views may idle.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host, e.g. `0.0.0.0`.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Inactivity after which a view with no `WebSocket` is dismantled.
    pub view_idle_timeout: Duration,
    /// Period of the idle sweep. Must be non-zero.
    pub view_reap_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 8080,
            view_idle_timeout: Duration::from_secs(300),
            view_reap_interval: Duration::from_secs(30),
        }
    }
}

/// Serve the game until `Ctrl-C`.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] for an unparsable address, a zero sweep
/// period, or a port that cannot be bound, and [`ServerError::Serve`] if
/// Axum stops with an I/O error.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address: {e}")))?;
    if config.view_reap_interval.is_zero() {
        return Err(ServerError::Bind(
            "view reap interval must be non-zero".to_owned(),
        ));
    }

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    let reaper = spawn_view_reaper(
        Arc::clone(&state),
        config.view_reap_interval,
        config.view_idle_timeout,
    );
    info!(
        %addr,
        idle_timeout_secs = config.view_idle_timeout.as_secs(),
        "Tapcoin listening"
    );

    let served = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;
    reaper.abort();
    served.map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    info!("Tapcoin stopped serving");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Why the game server could not start or keep serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listener could not be set up.
    #[error("bind error: {0}")]
    Bind(String),

    /// Axum stopped with an I/O error.
    #[error("serve error: {0}")]
    Serve(String),
}

#[cfg(test)]
mod tests {
    use tapcoin_core::rules::GameRules;
    use tapcoin_core::session::SessionManager;
    use tapcoin_db::{AuthBackend, MemoryAccounts, MemoryRecords, RecordStore};

    use super::*;

    fn state() -> Arc<AppState> {
        let sessions = SessionManager::new(
            AuthBackend::Memory(MemoryAccounts::new()),
            RecordStore::Memory(MemoryRecords::new()),
            2532,
        );
        Arc::new(AppState::new(GameRules::default(), sessions))
    }

    #[tokio::test]
    async fn unparsable_host_is_a_bind_error() {
        let config = ServerConfig {
            host: "not a host".to_owned(),
            ..ServerConfig::default()
        };
        let result = start_server(&config, state()).await;
        assert!(matches!(result, Err(ServerError::Bind(_))));
    }

    #[tokio::test]
    async fn zero_sweep_period_is_refused() {
        let config = ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: 0,
            view_reap_interval: Duration::ZERO,
            ..ServerConfig::default()
        };
        let result = start_server(&config, state()).await;
        assert!(matches!(result, Err(ServerError::Bind(_))));
    }
}
