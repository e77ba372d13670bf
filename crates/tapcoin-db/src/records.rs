//! The document store collaborator.

use tapcoin_types::{Identity, UserRecord};

use crate::dragonfly::DragonflyPool;
use crate::error::PersistenceError;
use crate::memory::MemoryRecords;

/// Where user records live.
#[derive(Clone)]
pub enum RecordStore {
    /// JSON documents in `Dragonfly`.
    Dragonfly(DragonflyPool),
    /// In-process records.
    Memory(MemoryRecords),
}

impl RecordStore {
    /// Create the record for a new identity.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] from the selected backend.
    pub async fn create_record(
        &self,
        identity: &Identity,
        record: &UserRecord,
    ) -> Result<(), PersistenceError> {
        match self {
            Self::Dragonfly(pool) => pool.create_record(identity, record).await,
            Self::Memory(records) => records.create_record(identity, record).await,
        }
    }

    /// Read the record for `identity`; `None` if it was never created.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] from the selected backend.
    pub async fn read_record(
        &self,
        identity: &Identity,
    ) -> Result<Option<UserRecord>, PersistenceError> {
        match self {
            Self::Dragonfly(pool) => pool.read_record(identity).await,
            Self::Memory(records) => records.read_record(identity).await,
        }
    }

    /// Overwrite `points` and `energy` on the record for `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] from the selected backend, including
    /// [`PersistenceError::KeyNotFound`] when no record exists.
    pub async fn update_fields(
        &self,
        identity: &Identity,
        points: u64,
        energy: u32,
    ) -> Result<(), PersistenceError> {
        match self {
            Self::Dragonfly(pool) => pool.update_fields(identity, points, energy).await,
            Self::Memory(records) => records.update_fields(identity, points, energy).await,
        }
    }

    /// Backend name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Dragonfly(_) => "dragonfly",
            Self::Memory(_) => "memory",
        }
    }
}
