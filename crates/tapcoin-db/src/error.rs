//! Error types for the collaborator layer.
//!
//! Two families, matching the two collaborators:
//!
//! - [`AuthError`] -- the authentication collaborator refused or failed.
//!   Bad credentials and duplicate accounts are reported as-is; nothing
//!   here interprets them further.
//! - [`PersistenceError`] -- reading or writing a user record failed.
//!   Callers log these and keep their local state.

/// Errors from the authentication collaborator.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// An account already exists for this email.
    #[error("an account already exists for {email}")]
    EmailExists {
        /// The email that was taken.
        email: String,
    },

    /// Unknown email or wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The identity provider rejected the request for another reason.
    #[error("identity provider rejected the request: {0}")]
    Provider(String),

    /// The `PostgreSQL` account store failed.
    #[error("account store error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A password could not be hashed.
    #[error("password hashing failed: {0}")]
    Hashing(String),

    /// The identity provider could not be reached or answered garbage.
    #[error("identity provider transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Errors from the user-record store.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The record to update does not exist.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// The store refused service (e.g. switched offline).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
