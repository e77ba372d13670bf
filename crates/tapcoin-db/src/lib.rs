//! Collaborator backends for Tapcoin.
//!
//! The game talks to two external collaborators: one that issues
//! identities and one that stores a small record per identity. Each is an
//! enum over its concrete backends.
//!
//! ```text
//! SessionManager
//!     |
//!     +-- AuthBackend
//!     |     |-- Postgres         (accounts table, Argon2id hashes)
//!     |     |-- IdentityToolkit  (REST identity provider)
//!     |     +-- Memory
//!     |
//!     +-- RecordStore
//!           |-- Dragonfly        (user:{identity}:record JSON documents)
//!           +-- Memory
//! ```
//!
//! # Modules
//!
//! - [`auth`] -- authentication dispatch
//! - [`records`] -- record store dispatch
//! - [`accounts`] -- `PostgreSQL` account operations
//! - [`password`] -- Argon2id password hashing
//! - [`postgres`] -- `PostgreSQL` connection pool and migrations
//! - [`identity_toolkit`] -- REST identity provider client
//! - [`dragonfly`] -- `Dragonfly` record documents
//! - [`memory`] -- in-process backends
//! - [`error`] -- shared error types

pub mod accounts;
pub mod auth;
pub mod dragonfly;
pub mod error;
pub mod identity_toolkit;
pub mod memory;
pub mod password;
pub mod postgres;
pub mod records;

// Re-export primary types for convenience.
pub use accounts::{AccountRow, PgAccounts};
pub use auth::AuthBackend;
pub use dragonfly::DragonflyPool;
pub use error::{AuthError, PersistenceError};
pub use identity_toolkit::{DEFAULT_IDENTITY_API_URL, IdentityToolkitClient};
pub use memory::{MemoryAccounts, MemoryRecords};
pub use postgres::{PostgresConfig, PostgresPool};
pub use records::RecordStore;
