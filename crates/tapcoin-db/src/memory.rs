//! In-process collaborator backends.
//!
//! Used for local development and throughout the test suites. Both types
//! are cheap to clone; clones share the same underlying maps.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tapcoin_types::{Credentials, Identity, UserRecord};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AuthError, PersistenceError};
use crate::password::{hash_password, verify_password};

#[derive(Debug, Clone)]
struct StoredAccount {
    identity: Identity,
    password_hash: String,
}

/// Accounts kept in memory, keyed by email.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccounts {
    accounts: Arc<RwLock<BTreeMap<String, StoredAccount>>>,
}

impl MemoryAccounts {
    /// Create an empty account table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account and return its identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailExists`] if the email is taken, or
    /// [`AuthError::Hashing`] if the password cannot be hashed.
    pub async fn create_account(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let password_hash = hash_password(&credentials.password).await?;
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&credentials.email) {
            return Err(AuthError::EmailExists {
                email: credentials.email.clone(),
            });
        }

        let identity = Identity::new(Uuid::now_v7().to_string());
        accounts.insert(
            credentials.email.clone(),
            StoredAccount {
                identity: identity.clone(),
                password_hash,
            },
        );
        Ok(identity)
    }

    /// Check credentials and return the matching identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown email or a
    /// wrong password.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let account = self.accounts.read().await.get(&credentials.email).cloned();
        let Some(account) = account else {
            return Err(AuthError::InvalidCredentials);
        };
        if verify_password(&credentials.password, &account.password_hash).await {
            Ok(account.identity)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Number of registered accounts.
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// Whether no account is registered.
    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

/// User records kept in memory, keyed by identity.
///
/// [`MemoryRecords::set_unavailable`] flips every operation into
/// [`PersistenceError::Unavailable`] until switched back.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecords {
    records: Arc<RwLock<BTreeMap<Identity, UserRecord>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryRecords {
    /// Create an empty record table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch the store offline (`true`) or back online (`false`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), PersistenceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "memory record store switched offline".to_owned(),
            ));
        }
        Ok(())
    }

    /// Store `record` for `identity`, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Unavailable`] while switched offline.
    pub async fn create_record(
        &self,
        identity: &Identity,
        record: &UserRecord,
    ) -> Result<(), PersistenceError> {
        self.check_available()?;
        self.records
            .write()
            .await
            .insert(identity.clone(), record.clone());
        Ok(())
    }

    /// Read the record for `identity`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Unavailable`] while switched offline.
    pub async fn read_record(
        &self,
        identity: &Identity,
    ) -> Result<Option<UserRecord>, PersistenceError> {
        self.check_available()?;
        Ok(self.records.read().await.get(identity).cloned())
    }

    /// Overwrite `points` and `energy` on an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::KeyNotFound`] if no record exists,
    /// [`PersistenceError::Unavailable`] while switched offline.
    pub async fn update_fields(
        &self,
        identity: &Identity,
        points: u64,
        energy: u32,
    ) -> Result<(), PersistenceError> {
        self.check_available()?;
        let mut records = self.records.write().await;
        let record = records
            .get_mut(identity)
            .ok_or_else(|| PersistenceError::KeyNotFound(identity.to_string()))?;
        record.points = points;
        record.energy = Some(energy);
        Ok(())
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether no record is stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}
