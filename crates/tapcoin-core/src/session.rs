//! Session manager: identity state and every read/write of persisted
//! user state.
//!
//! The manager is stateless apart from the collaborator handles; the
//! current [`Session`] belongs to the view. Persistence is best-effort:
//! failures are logged and never roll back local counters.
//!
//! # Write ordering
//!
//! Each background write carries the snapshot taken when it was issued.
//! Writes are not sequenced, so an older snapshot that completes late can
//! overwrite a newer one. Whichever write lands last wins.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tapcoin_db::{AuthBackend, AuthError, PersistenceError, RecordStore};
use tapcoin_types::{Credentials, Identity, UserRecord, UserState};
use tokio::task::JoinHandle;

/// Errors surfaced by sign-up and sign-in.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The authentication collaborator refused or failed.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The record store failed.
    #[error("persistence failed: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Whether a view is signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    /// No identity; taps stay local.
    #[default]
    Anonymous,
    /// Signed in as this identity.
    Authenticated(Identity),
}

impl Session {
    /// The active identity, if any.
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(identity) => Some(identity),
        }
    }

    /// Whether an identity is active.
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Handles to the two collaborators plus the default starting energy.
#[derive(Clone)]
pub struct SessionManager {
    auth: AuthBackend,
    records: RecordStore,
    starting_energy: u32,
}

impl SessionManager {
    /// Bind the collaborators.
    pub const fn new(auth: AuthBackend, records: RecordStore, starting_energy: u32) -> Self {
        Self {
            auth,
            records,
            starting_energy,
        }
    }

    /// Create an account and its fresh record (`points = 0`, starting
    /// energy).
    ///
    /// If the account is created but the record write fails, the account
    /// remains and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Auth`] if the collaborator refuses the
    /// account, [`SessionError::Persistence`] if the record write fails.
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<Identity, SessionError> {
        let identity = self.auth.create_account(credentials).await.map_err(|e| {
            tracing::warn!(backend = self.auth.name(), error = %e, "Sign-up refused");
            e
        })?;

        let record = UserRecord {
            email: credentials.email.clone(),
            points: 0,
            energy: Some(self.starting_energy),
        };
        self.records
            .create_record(&identity, &record)
            .await
            .map_err(|e| {
                tracing::error!(
                    %identity,
                    backend = self.records.name(),
                    error = %e,
                    "Account created but its record could not be written"
                );
                e
            })?;

        tracing::info!(%identity, "Account created");
        Ok(identity)
    }

    /// Authenticate and load the stored state.
    ///
    /// A missing record yields `points = 0` and the starting energy; nothing
    /// is written back. A record whose `energy` is absent or zero also gets
    /// the starting energy.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Auth`] on invalid credentials,
    /// [`SessionError::Persistence`] if the record read fails.
    pub async fn sign_in(
        &self,
        credentials: &Credentials,
    ) -> Result<(Identity, UserState), SessionError> {
        let identity = self.auth.authenticate(credentials).await.map_err(|e| {
            tracing::warn!(backend = self.auth.name(), error = %e, "Sign-in refused");
            e
        })?;

        let record = self.records.read_record(&identity).await.map_err(|e| {
            tracing::warn!(%identity, error = %e, "Failed to read user record");
            e
        })?;

        let (points, energy) = match record {
            Some(record) => {
                let energy = record
                    .energy
                    .filter(|&energy| energy > 0)
                    .unwrap_or(self.starting_energy);
                (record.points, energy)
            }
            None => {
                tracing::debug!(%identity, "No stored record, using defaults");
                (0, self.starting_energy)
            }
        };

        tracing::info!(%identity, points, energy, "Signed in");
        let state = UserState {
            identity: Some(identity.clone()),
            points,
            energy,
        };
        Ok((identity, state))
    }

    /// Overwrite the stored points and energy. No retry.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] from the record store.
    pub async fn persist(
        &self,
        identity: &Identity,
        points: u64,
        energy: u32,
    ) -> Result<(), PersistenceError> {
        self.records.update_fields(identity, points, energy).await
    }

    /// Spawn a fire-and-forget [`persist`](Self::persist) of this snapshot.
    ///
    /// The outcome is logged unless `alive` has been cleared by then, in
    /// which case it is dropped silently.
    pub fn persist_in_background(
        &self,
        identity: Identity,
        points: u64,
        energy: u32,
        alive: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            let result = manager.persist(&identity, points, energy).await;
            if !alive.load(Ordering::Acquire) {
                return;
            }
            match result {
                Ok(()) => tracing::trace!(%identity, points, energy, "Persisted"),
                Err(e) => tracing::warn!(
                    %identity,
                    points,
                    energy,
                    error = %e,
                    "Persist failed, keeping local state"
                ),
            }
        })
    }

    /// Energy given to fresh accounts and records without energy.
    pub const fn starting_energy(&self) -> u32 {
        self.starting_energy
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tapcoin_db::{MemoryAccounts, MemoryRecords};

    use super::*;

    struct Fixture {
        accounts: MemoryAccounts,
        records: MemoryRecords,
        manager: SessionManager,
    }

    fn fixture() -> Fixture {
        let accounts = MemoryAccounts::new();
        let records = MemoryRecords::new();
        let manager = SessionManager::new(
            AuthBackend::Memory(accounts.clone()),
            RecordStore::Memory(records.clone()),
            2532,
        );
        Fixture {
            accounts,
            records,
            manager,
        }
    }

    fn creds() -> Credentials {
        Credentials {
            email: "player@tapcoin.test".to_owned(),
            password: "pw".to_owned(),
        }
    }

    #[tokio::test]
    async fn sign_up_then_sign_in_yields_fresh_state() {
        let f = fixture();
        let identity = f.manager.sign_up(&creds()).await.unwrap();
        let (signed_in, state) = f.manager.sign_in(&creds()).await.unwrap();

        assert_eq!(identity, signed_in);
        assert_eq!(state.points, 0);
        assert_eq!(state.energy, 2532);
        assert_eq!(state.identity, Some(identity.clone()));

        let record = f.records.read_record(&identity).await.unwrap().unwrap();
        assert_eq!(record.email, "player@tapcoin.test");
    }

    #[tokio::test]
    async fn duplicate_sign_up_is_an_auth_error() {
        let f = fixture();
        f.manager.sign_up(&creds()).await.unwrap();
        let err = f.manager.sign_up(&creds()).await.unwrap_err();
        assert!(matches!(err, SessionError::Auth(AuthError::EmailExists { .. })));
    }

    #[tokio::test]
    async fn wrong_password_is_an_auth_error() {
        let f = fixture();
        f.manager.sign_up(&creds()).await.unwrap();
        let wrong = Credentials {
            password: "nope".to_owned(),
            ..creds()
        };
        let err = f.manager.sign_in(&wrong).await.unwrap_err();
        assert!(matches!(err, SessionError::Auth(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn sign_in_without_record_returns_defaults_and_writes_nothing() {
        let f = fixture();
        f.accounts.create_account(&creds()).await.unwrap();

        let (_, state) = f.manager.sign_in(&creds()).await.unwrap();
        assert_eq!((state.points, state.energy), (0, 2532));
        assert!(f.records.is_empty().await);
    }

    #[tokio::test]
    async fn record_without_energy_gets_starting_energy() {
        let f = fixture();
        let identity = f.accounts.create_account(&creds()).await.unwrap();
        let record = UserRecord {
            email: creds().email,
            points: 96,
            energy: None,
        };
        f.records.create_record(&identity, &record).await.unwrap();

        let (_, state) = f.manager.sign_in(&creds()).await.unwrap();
        assert_eq!((state.points, state.energy), (96, 2532));
    }

    #[tokio::test]
    async fn stored_zero_energy_signs_in_with_starting_energy() {
        let f = fixture();
        let identity = f.accounts.create_account(&creds()).await.unwrap();
        let record = UserRecord {
            email: creds().email,
            points: 5,
            energy: Some(0),
        };
        f.records.create_record(&identity, &record).await.unwrap();

        let (_, state) = f.manager.sign_in(&creds()).await.unwrap();
        assert_eq!((state.points, state.energy), (5, 2532));
    }

    #[tokio::test]
    async fn account_tapped_empty_refills_on_next_sign_in() {
        let f = fixture();
        let identity = f.manager.sign_up(&creds()).await.unwrap();
        // 211 taps of 12 drain the starting 2532 exactly.
        f.manager.persist(&identity, 2532, 0).await.unwrap();

        let (_, state) = f.manager.sign_in(&creds()).await.unwrap();
        assert_eq!((state.points, state.energy), (2532, 2532));
    }

    #[tokio::test]
    async fn sign_in_read_failure_is_reported() {
        let f = fixture();
        f.manager.sign_up(&creds()).await.unwrap();
        f.records.set_unavailable(true);

        let err = f.manager.sign_in(&creds()).await.unwrap_err();
        assert!(matches!(err, SessionError::Persistence(_)));
    }

    #[tokio::test]
    async fn sign_up_record_failure_leaves_account() {
        let f = fixture();
        f.records.set_unavailable(true);

        let err = f.manager.sign_up(&creds()).await.unwrap_err();
        assert!(matches!(err, SessionError::Persistence(_)));
        assert_eq!(f.accounts.len().await, 1);
    }

    #[tokio::test]
    async fn persist_overwrites_fields() {
        let f = fixture();
        let identity = f.manager.sign_up(&creds()).await.unwrap();
        f.manager.persist(&identity, 60, 2472).await.unwrap();

        let (_, state) = f.manager.sign_in(&creds()).await.unwrap();
        assert_eq!((state.points, state.energy), (60, 2472));
    }

    #[tokio::test]
    async fn background_persist_writes_snapshot() {
        let f = fixture();
        let identity = f.manager.sign_up(&creds()).await.unwrap();
        let alive = Arc::new(AtomicBool::new(true));

        f.manager
            .persist_in_background(identity.clone(), 12, 2520, alive)
            .await
            .unwrap();

        let record = f.records.read_record(&identity).await.unwrap().unwrap();
        assert_eq!((record.points, record.energy), (12, Some(2520)));
    }

    #[tokio::test]
    async fn background_persist_failure_does_not_panic() {
        let f = fixture();
        let identity = f.manager.sign_up(&creds()).await.unwrap();
        f.records.set_unavailable(true);

        let alive = Arc::new(AtomicBool::new(false));
        let joined = f
            .manager
            .persist_in_background(identity, 12, 2520, alive)
            .await;
        assert!(joined.is_ok());
    }

    #[test]
    fn session_reports_identity() {
        let session = Session::Authenticated(Identity::new("u1"));
        assert!(session.is_authenticated());
        assert_eq!(session.identity().map(Identity::as_str), Some("u1"));
        assert_eq!(Session::default().identity(), None);
    }
}
