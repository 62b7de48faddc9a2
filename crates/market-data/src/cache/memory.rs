//! In-process snapshot store with TTL, backed by moka.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::cache::SnapshotStore;
use crate::models::Snapshot;

/// In-process fallback store. Entries expire `ttl` after write and
/// are never returned once expired.
pub struct MemorySnapshotStore {
    cache: Cache<String, Snapshot>,
}

impl MemorySnapshotStore {
    /// Create a store whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(64)
                .build(),
        }
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn get(&self, key: &str) -> Option<Snapshot> {
        self.cache.get(key).await
    }

    async fn set(&self, key: &str, snapshot: &Snapshot) {
        self.cache.insert(key.to_string(), snapshot.clone()).await;
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
