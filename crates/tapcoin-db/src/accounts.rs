//! `PostgreSQL` account store.
//!
//! Issues UUID v7 identities and keeps an Argon2id password hash per
//! email. Emails are stored exactly as given.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tapcoin_types::{Credentials, Identity};
use uuid::Uuid;

use crate::error::AuthError;
use crate::password::{hash_password, verify_password};

/// A row from the `accounts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    /// Account id, exposed as the identity.
    pub id: Uuid,
    /// Account email.
    pub email: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Account operations on the `accounts` table.
#[derive(Clone)]
pub struct PgAccounts {
    pool: PgPool,
}

impl PgAccounts {
    /// Bind account operations to a pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an account and return its identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailExists`] if the email is taken,
    /// [`AuthError::Hashing`] if the password cannot be hashed, or
    /// [`AuthError::Postgres`] on any other database failure.
    pub async fn create_account(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let id = Uuid::now_v7();
        let password_hash = hash_password(&credentials.password).await?;

        let inserted = sqlx::query(
            r"INSERT INTO accounts (id, email, password_hash)
              VALUES ($1, $2, $3)",
        )
        .bind(id)
        .bind(&credentials.email)
        .bind(&password_hash)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {
                tracing::debug!(%id, "Account created");
                Ok(Identity::new(id.to_string()))
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AuthError::EmailExists {
                    email: credentials.email.clone(),
                })
            }
            Err(e) => Err(AuthError::Postgres(e)),
        }
    }

    /// Check credentials and return the matching identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown email or a
    /// wrong password, [`AuthError::Postgres`] if the lookup fails.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let row = self.find_by_email(&credentials.email).await?;
        let Some(row) = row else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(&credentials.password, &row.password_hash).await {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(Identity::new(row.id.to_string()))
    }

    /// Look up an account by email.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Postgres`] if the query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<AccountRow>, AuthError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"SELECT id, email, password_hash, created_at
              FROM accounts
              WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
