//! `Dragonfly` (Redis-compatible) user-record store.
//!
//! One JSON document per identity. Documents hold exactly `email`,
//! `points` and `energy`.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `user:{identity}:record` | JSON | [`UserRecord`] for one identity |

use fred::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tapcoin_types::{Identity, UserRecord};

use crate::error::PersistenceError;

/// Key holding the record for `identity`.
pub fn record_key(identity: &Identity) -> String {
    format!("user:{identity}:record")
}

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
#[derive(Clone)]
pub struct DragonflyPool {
    client: Client,
}

impl DragonflyPool {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Config`] if the URL cannot be parsed.
    /// Returns [`PersistenceError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, PersistenceError> {
        let config = Config::from_url(url)
            .map_err(|e| PersistenceError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }

    // =========================================================================
    // Generic JSON get/set/delete
    // =========================================================================

    /// Serialize `value` as JSON and store it at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Serialization`] if serialization fails.
    /// Returns [`PersistenceError::Dragonfly`] if the write fails.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(value)?;
        let _: () = self.client.set(key, json.as_str(), None, None, false).await?;
        Ok(())
    }

    /// Read the value at `key` and deserialize from JSON.
    ///
    /// A missing key reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Serialization`] if deserialization fails.
    /// Returns [`PersistenceError::Dragonfly`] if the read fails.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, PersistenceError> {
        let value: Option<String> = self.client.get(key).await?;
        value
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(PersistenceError::from)
    }

    /// Delete a key from `Dragonfly`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Dragonfly`] if the delete fails.
    pub async fn delete(&self, key: &str) -> Result<(), PersistenceError> {
        let _: u32 = self.client.del(key).await?;
        Ok(())
    }

    // =========================================================================
    // User records -- user:{identity}:record
    // =========================================================================

    /// Store a fresh record for `identity`, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if serialization or write fails.
    pub async fn create_record(
        &self,
        identity: &Identity,
        record: &UserRecord,
    ) -> Result<(), PersistenceError> {
        self.set_json(&record_key(identity), record).await
    }

    /// Read the record for `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if deserialization or read fails.
    pub async fn read_record(
        &self,
        identity: &Identity,
    ) -> Result<Option<UserRecord>, PersistenceError> {
        self.get_json(&record_key(identity)).await
    }

    /// Overwrite `points` and `energy` on an existing record.
    ///
    /// Read-modify-write without a transaction: two concurrent updates
    /// resolve by whichever write lands last.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::KeyNotFound`] if no record exists.
    /// Returns [`PersistenceError`] if the read or write fails.
    pub async fn update_fields(
        &self,
        identity: &Identity,
        points: u64,
        energy: u32,
    ) -> Result<(), PersistenceError> {
        let key = record_key(identity);
        let mut record: UserRecord = self
            .get_json(&key)
            .await?
            .ok_or_else(|| PersistenceError::KeyNotFound(key.clone()))?;
        record.points = points;
        record.energy = Some(energy);
        self.set_json(&key, &record).await
    }

    /// Return a reference to the underlying [`Client`].
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_key_embeds_identity() {
        assert_eq!(record_key(&Identity::new("abc")), "user:abc:record");
    }
}
