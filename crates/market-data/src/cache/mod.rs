//! Snapshot caching.
//!
//! One capability, two implementations selected at construction time:
//! a durable redis-backed store and an in-process moka store. The
//! redis store embeds a memory store and degrades to it transparently
//! when redis is unreachable, so callers never observe cache failure.

mod memory;
mod redis;

use std::time::Duration;

use async_trait::async_trait;

use crate::models::Snapshot;

pub use self::memory::MemorySnapshotStore;
pub use self::redis::RedisSnapshotStore;

/// Retention TTL applied to every snapshot write.
pub const SNAPSHOT_TTL: Duration = Duration::from_secs(300);

/// A TTL key-value store of market snapshots.
///
/// Writes are last-write-wins per key; reads never return a
/// TTL-expired entry. Implementations must not surface storage
/// failure: a failed read is a miss, a failed write is dropped (after
/// degrading to a fallback where one exists).
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the snapshot for a cache key, if present and unexpired.
    async fn get(&self, key: &str) -> Option<Snapshot>;

    /// Write the snapshot for a cache key with the store's TTL.
    async fn set(&self, key: &str, snapshot: &Snapshot);

    /// Short backend label for health reporting.
    fn backend(&self) -> &'static str;
}
