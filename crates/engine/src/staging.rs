//! Short-lived store for prepared copies.
//!
//! Entries expire after a fixed TTL and are never extended. Expired entries
//! are invisible to [`StagedCopyStore::get`] and [`StagedCopyStore::take`],
//! and removed by [`StagedCopyStore::purge_expired`].

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::copy::StagedCopy;

/// A staged copy with its fixed expiry.
pub struct StagedEntry {
    pub value: StagedCopy,
    expires_at: Instant,
}

#[derive(Default)]
pub struct StagedCopyStore {
    entries: RwLock<HashMap<String, StagedEntry>>,
}

impl StagedCopyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, key: String, value: StagedCopy, ttl: Duration) {
        let entry = StagedEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key, entry);
    }

    /// A clone of the live entry under `key`.
    pub async fn get(&self, key: &str) -> Option<StagedCopy> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.value.clone())
    }

    /// Remove the live entry under `key` and hand it to the caller.
    ///
    /// At most one caller claims a given entry.
    pub async fn take(&self, key: &str) -> Option<StagedEntry> {
        let entry = self.entries.write().await.remove(key)?;
        (entry.expires_at > Instant::now()).then_some(entry)
    }

    /// Put a claimed entry back under its original expiry.
    ///
    /// An entry that expired while claimed is dropped.
    pub async fn restore(&self, key: String, entry: StagedEntry) {
        if entry.expires_at <= Instant::now() {
            return;
        }
        self.entries.write().await.entry(key).or_insert(entry);
    }

    pub async fn remove(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Drop every expired entry, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
