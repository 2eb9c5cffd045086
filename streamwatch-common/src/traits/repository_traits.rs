use async_trait::async_trait;
use crate::error::Error;
use crate::models::stream::{StreamKey, StreamRecord};

/// Durable key/value mirror of the registry, keyed by `platform:serviceID`.
///
/// Only used to rebuild the in-memory registry after a restart, so every
/// write is an upsert of the whole record.
#[async_trait]
pub trait StreamStore: Send + Sync {
    /// Loads every persisted record.
    async fn load_all(&self) -> Result<Vec<StreamRecord>, Error>;

    /// Inserts or replaces the record under `record.key()`.
    async fn put(&self, record: &StreamRecord) -> Result<(), Error>;

    /// Deletes the record for `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &StreamKey) -> Result<(), Error>;
}
