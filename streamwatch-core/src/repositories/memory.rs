//! In-memory store, for tests and for running without a database file.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use streamwatch_common::models::stream::{StreamKey, StreamRecord};
use streamwatch_common::traits::repository_traits::StreamStore;
use crate::Error;

/// `BTreeMap` keyed by the rendered `platform:serviceID`, holding the JSON
/// form so it behaves like the real key/value table.
#[derive(Default)]
pub struct InMemoryStreamStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl InMemoryStreamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON currently stored under `key`, if any.
    pub fn raw(&self, key: &StreamKey) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(&key.to_string()).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StreamStore for InMemoryStreamStore {
    async fn load_all(&self) -> Result<Vec<StreamRecord>, Error> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut out = Vec::with_capacity(entries.len());
        for value in entries.values() {
            out.push(serde_json::from_str(value)?);
        }
        Ok(out)
    }

    async fn put(&self, record: &StreamRecord) -> Result<(), Error> {
        let value = serde_json::to_string(record)?;
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(record.key().to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &StreamKey) -> Result<(), Error> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(&key.to_string());
        Ok(())
    }
}
