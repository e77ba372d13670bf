//! Tapcoin server binary.
//!
//! Loads configuration, installs logging, connects the collaborator
//! backends, and serves the game until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `tapcoin-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the authentication backend
//! 4. Build the record store
//! 5. Create the session manager and application state
//! 6. Serve HTTP until shutdown

mod backends;
mod error;

use std::path::Path;
use std::sync::Arc;

use tapcoin_core::config::{LogFormat, LoggingConfig, TapcoinConfig};
use tapcoin_core::session::SessionManager;
use tapcoin_server::{AppState, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Path of the configuration file, relative to the working directory.
const CONFIG_PATH: &str = "tapcoin-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the server fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!("tapcoin starting");
    if from_file {
        info!(path = CONFIG_PATH, "Configuration loaded");
    } else {
        info!("Config file not found, using defaults");
    }

    let rules = config.game.rules()?;
    info!(
        title = %rules.title,
        points_per_tap = rules.points_per_tap,
        energy_per_tap = rules.energy_per_tap,
        energy_max = rules.energy_max,
        starting_energy = rules.starting_energy,
        regen_interval_ms = config.game.regen_interval_ms,
        "Game rules loaded"
    );

    // 3. Authentication backend.
    let auth = backends::build_auth(&config.auth, &config.infrastructure).await?;

    // 4. Record store.
    let records = backends::build_records(config.records.backend, &config.infrastructure)
        .await
        .map_err(AppError::from)?;

    // 5. Session manager and application state.
    let sessions = SessionManager::new(auth, records, rules.starting_energy);
    let state = Arc::new(AppState::new(rules, sessions));

    // 6. Serve.
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        view_idle_timeout: config.server.view_idle_timeout(),
        view_reap_interval: config.server.view_reap_interval(),
    };
    tapcoin_server::start_server(&server_config, state)
        .await
        .map_err(AppError::from)?;

    info!("tapcoin stopped");
    Ok(())
}

/// Load configuration from [`CONFIG_PATH`], falling back to defaults
/// (with environment overrides) when the file does not exist.
fn load_config() -> Result<(TapcoinConfig, bool), AppError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok((TapcoinConfig::from_file(config_path)?, true))
    } else {
        Ok((TapcoinConfig::parse("")?, false))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `logging.level`.
fn init_logging(logging: &LoggingConfig) -> Result<(), AppError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let result = match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };

    result.map_err(|e| AppError::Logging {
        message: e.to_string(),
    })
}
