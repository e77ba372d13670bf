//! The authentication collaborator.
//!
//! Uses enum dispatch rather than a trait object: the operations are
//! async and the set of backends is closed.

use tapcoin_types::{Credentials, Identity};

use crate::accounts::PgAccounts;
use crate::error::AuthError;
use crate::identity_toolkit::IdentityToolkitClient;
use crate::memory::MemoryAccounts;

/// Where accounts live.
#[derive(Clone)]
pub enum AuthBackend {
    /// `accounts` table in `PostgreSQL`.
    Postgres(PgAccounts),
    /// REST identity provider.
    IdentityToolkit(IdentityToolkitClient),
    /// In-process accounts.
    Memory(MemoryAccounts),
}

impl AuthBackend {
    /// Create an account and return the identity issued for it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] from the selected backend.
    pub async fn create_account(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        match self {
            Self::Postgres(accounts) => accounts.create_account(credentials).await,
            Self::IdentityToolkit(client) => client.create_account(credentials).await,
            Self::Memory(accounts) => accounts.create_account(credentials).await,
        }
    }

    /// Check credentials and return the matching identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] from the selected backend.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        match self {
            Self::Postgres(accounts) => accounts.authenticate(credentials).await,
            Self::IdentityToolkit(client) => client.authenticate(credentials).await,
            Self::Memory(accounts) => accounts.authenticate(credentials).await,
        }
    }

    /// Backend name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::IdentityToolkit(_) => "identity_toolkit",
            Self::Memory(_) => "memory",
        }
    }
}
