//! Collaborator construction from configuration.

use tapcoin_core::config::{
    AuthBackendKind, AuthConfig, ConfigError, InfrastructureConfig, RecordsBackendKind,
};
use tapcoin_db::{
    AuthBackend, DragonflyPool, IdentityToolkitClient, MemoryAccounts, MemoryRecords,
    PersistenceError, PostgresConfig, PostgresPool, RecordStore,
};
use tracing::{info, warn};

use crate::error::AppError;

/// Build the authentication backend.
///
/// The `PostgreSQL` backend connects and applies migrations before
/// returning. The identity provider needs an API key.
pub async fn build_auth(
    auth: &AuthConfig,
    infra: &InfrastructureConfig,
) -> Result<AuthBackend, AppError> {
    let backend = match auth.backend {
        AuthBackendKind::Memory => {
            warn!("Using in-memory accounts; they are lost on restart");
            AuthBackend::Memory(MemoryAccounts::new())
        }
        AuthBackendKind::Postgres => {
            let config = PostgresConfig::new(&infra.postgres_url)
                .with_max_connections(infra.postgres_max_connections);
            let pool = PostgresPool::connect(&config).await?;
            pool.run_migrations().await?;
            AuthBackend::Postgres(pool.accounts())
        }
        AuthBackendKind::IdentityToolkit => {
            if auth.identity_api_key.is_empty() {
                return Err(ConfigError::Invalid {
                    reason: "auth.identity_api_key (or IDENTITY_API_KEY) is required for identity_toolkit"
                        .to_owned(),
                }
                .into());
            }
            AuthBackend::IdentityToolkit(IdentityToolkitClient::new(
                &auth.identity_api_url,
                &auth.identity_api_key,
            ))
        }
    };
    info!(backend = backend.name(), "Authentication backend ready");
    Ok(backend)
}

/// Build the record store.
pub async fn build_records(
    kind: RecordsBackendKind,
    infra: &InfrastructureConfig,
) -> Result<RecordStore, PersistenceError> {
    let store = match kind {
        RecordsBackendKind::Memory => {
            warn!("Using in-memory user records; they are lost on restart");
            RecordStore::Memory(MemoryRecords::new())
        }
        RecordsBackendKind::Dragonfly => {
            RecordStore::Dragonfly(DragonflyPool::connect(&infra.dragonfly_url).await?)
        }
    };
    info!(backend = store.name(), "Record store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backends_need_no_infrastructure() {
        let infra = InfrastructureConfig::default();
        let auth = build_auth(&AuthConfig::default(), &infra).await;
        assert!(matches!(auth, Ok(AuthBackend::Memory(_))));

        let records = build_records(RecordsBackendKind::Memory, &infra).await;
        assert!(matches!(records, Ok(RecordStore::Memory(_))));
    }

    #[tokio::test]
    async fn identity_toolkit_requires_api_key() {
        let auth = AuthConfig {
            backend: AuthBackendKind::IdentityToolkit,
            identity_api_key: String::new(),
            ..AuthConfig::default()
        };
        let result = build_auth(&auth, &InfrastructureConfig::default()).await;
        assert!(matches!(
            result,
            Err(AppError::Config {
                source: ConfigError::Invalid { .. }
            })
        ));
    }
}
