// File: streamwatch-core/src/services/stream_registry.rs

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use streamwatch_common::models::platform::Platform;
use streamwatch_common::models::stream::{StreamKey, StreamRecord};
use streamwatch_common::traits::repository_traits::StreamStore;
use crate::Error;

/// In-memory source of truth for every tracked channel, mirrored
/// write-behind into a [`StreamStore`] for restart recovery.
///
/// A single lock covers the whole map; cardinality is low (tens to a few
/// hundred channels) and writes are rare.
pub struct StreamRegistry {
    records: Mutex<HashMap<StreamKey, StreamRecord>>,
    store: Arc<dyn StreamStore>,
}

impl StreamRegistry {
    /// An empty registry. Use [`StreamRegistry::load`] at boot instead.
    pub fn new(store: Arc<dyn StreamStore>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            store,
        }
    }

    /// Seeds the registry with everything in `store`.
    pub async fn load(store: Arc<dyn StreamStore>) -> Result<Self, Error> {
        let loaded = store.load_all().await?;
        let mut map = HashMap::with_capacity(loaded.len());
        for rec in loaded {
            map.insert(rec.key(), rec);
        }
        info!("Loaded {} tracked stream(s) from store", map.len());
        Ok(Self {
            records: Mutex::new(map),
            store,
        })
    }

    /// Starts tracking `platform:service_id` for `member_id`.
    ///
    /// Returns `Ok(false)` if the channel is already tracked (the existing
    /// record is left alone). On a store failure nothing is cached.
    pub async fn add(&self, platform: Platform, service_id: &str, member_id: &str) -> Result<bool, Error> {
        let key = channel_key(platform, service_id)?;

        let mut records = self.records.lock().await;
        if records.contains_key(&key) {
            debug!("add({}) => already tracked", key);
            return Ok(false);
        }

        let rec = StreamRecord::new(platform, &key.service_id, member_id);
        self.store.put(&rec).await?;
        records.insert(key.clone(), rec);
        info!("Now tracking {} for member '{}'", key, member_id);
        Ok(true)
    }

    /// Stops tracking a channel. Unknown keys are fine.
    pub async fn remove(&self, platform: Platform, service_id: &str) -> Result<(), Error> {
        let key = channel_key(platform, service_id)?;
        let mut records = self.records.lock().await;
        self.delete_locked(&mut records, &key).await
    }

    /// [`remove`](Self::remove), allowed only for the owning member or an
    /// administrator. Ownership is checked and the record deleted under one
    /// hold of the lock.
    pub async fn remove_for_member(
        &self,
        platform: Platform,
        service_id: &str,
        requester_member_id: &str,
        is_admin: bool,
    ) -> Result<(), Error> {
        let key = channel_key(platform, service_id)?;
        let mut records = self.records.lock().await;
        let allowed = match records.get(&key) {
            None => return Ok(()),
            Some(rec) => is_admin || rec.member_id == requester_member_id,
        };
        if !allowed {
            return Err(Error::Forbidden(format!(
                "member '{}' may not remove {}",
                requester_member_id, key
            )));
        }
        self.delete_locked(&mut records, &key).await
    }

    /// Store first, then cache; the caller holds the registry lock.
    async fn delete_locked(
        &self,
        records: &mut HashMap<StreamKey, StreamRecord>,
        key: &StreamKey,
    ) -> Result<(), Error> {
        self.store.delete(key).await?;
        if records.remove(key).is_some() {
            info!("Stopped tracking {}", key);
        }
        Ok(())
    }

    /// Snapshot of every record for `platform`, ordered by service id.
    pub async fn all(&self, platform: Platform) -> Vec<StreamRecord> {
        let records = self.records.lock().await;
        let mut out: Vec<StreamRecord> = records
            .values()
            .filter(|r| r.platform == platform)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.service_id.cmp(&b.service_id));
        out
    }

    /// First record (by key order) owned by `member_id`.
    pub async fn by_member_id(&self, member_id: &str) -> Option<StreamRecord> {
        let records = self.records.lock().await;
        records
            .values()
            .filter(|r| r.member_id == member_id)
            .min_by(|a, b| a.key().cmp(&b.key()))
            .cloned()
    }

    pub async fn get(&self, key: &StreamKey) -> Option<StreamRecord> {
        self.records.lock().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Read-modify-write of one record under the registry lock.
    ///
    /// `f` sees the current record and returns the replacement (or `None`
    /// to leave it untouched) plus a value handed back to the caller.
    /// Returns `None` if the key is no longer tracked.
    ///
    /// The store write happens before the lock is released so a concurrent
    /// `remove` can't be undone by it. A failed write is logged and the
    /// in-memory change is kept.
    pub async fn update_with<F, R>(&self, key: &StreamKey, f: F) -> Option<R>
    where
        F: FnOnce(&StreamRecord) -> (Option<StreamRecord>, R),
    {
        let mut records = self.records.lock().await;
        let current = records.get(key)?;
        let (replacement, out) = f(current);

        if let Some(rec) = replacement {
            if let Err(e) = self.store.put(&rec).await {
                error!("Failed to persist stream record {}: {}", key, e);
            }
            records.insert(key.clone(), rec);
        }
        Some(out)
    }
}

/// Service ids are trimmed and must not be blank, on every entry point.
fn channel_key(platform: Platform, service_id: &str) -> Result<StreamKey, Error> {
    let service_id = service_id.trim();
    if service_id.is_empty() {
        return Err(Error::Parse("service id must not be empty".into()));
    }
    Ok(StreamKey::new(platform, service_id))
}
