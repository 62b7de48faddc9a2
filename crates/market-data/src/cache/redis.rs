//! Durable snapshot store backed by redis.
//!
//! Snapshots are stored as JSON strings with a per-write TTL (`SET`
//! with `EX`). The store embeds an in-process fallback and degrades to
//! it whenever redis errs; the two paths are not merged — redis, when
//! reachable, is authoritative.

use std::time::Duration;

use async_trait::async_trait;
use log::warn;
use redis::AsyncCommands;

use crate::cache::{MemorySnapshotStore, SnapshotStore};
use crate::errors::QuoteError;
use crate::models::Snapshot;

/// Redis-backed snapshot store with transparent in-process fallback.
pub struct RedisSnapshotStore {
    client: redis::Client,
    fallback: MemorySnapshotStore,
    ttl: Duration,
}

impl RedisSnapshotStore {
    /// Create a store for the given redis URL. Fails only on an
    /// unparseable URL; connections are established per operation.
    pub fn connect(url: &str, ttl: Duration) -> Result<Self, QuoteError> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            fallback: MemorySnapshotStore::new(ttl),
            ttl,
        })
    }

    async fn try_get(&self, key: &str) -> Result<Option<Snapshot>, QuoteError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let json: Option<String> = conn.get(key).await?;
        json.map(|s| {
            serde_json::from_str(&s).map_err(|e| QuoteError::CacheUnavailable(e.to_string()))
        })
        .transpose()
    }

    async fn try_set(&self, key: &str, snapshot: &Snapshot) -> Result<(), QuoteError> {
        let payload = serde_json::to_string(snapshot)
            .map_err(|e| QuoteError::CacheUnavailable(e.to_string()))?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, payload, self.ttl.as_secs()).await?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for RedisSnapshotStore {
    async fn get(&self, key: &str) -> Option<Snapshot> {
        match self.try_get(key).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("Snapshot store: redis get failed, using fallback: {}", err);
                self.fallback.get(key).await
            }
        }
    }

    async fn set(&self, key: &str, snapshot: &Snapshot) {
        if let Err(err) = self.try_set(key, snapshot).await {
            warn!("Snapshot store: redis set failed, using fallback: {}", err);
            self.fallback.set(key, snapshot).await;
        }
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
