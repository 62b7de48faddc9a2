//! Process-wide cooldown gate for the upstream provider.
//!
//! Once the provider signals quota exhaustion, further upstream calls
//! are blocked until the cooldown elapses. A single atomic timestamp
//! suffices: contention only affects advisory skip behavior, not
//! correctness, so no further locking is needed.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::Utc;
use log::info;

/// Cooldown gate keyed on a `blocked_until` epoch-millis timestamp.
///
/// One instance per orchestrator; the state is in-memory and resets
/// on process restart.
#[derive(Debug, Default)]
pub struct RateGuard {
    blocked_until_ms: AtomicI64,
}

impl RateGuard {
    /// Create an unblocked guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff the cooldown has elapsed and upstream calls may be
    /// attempted.
    pub fn available(&self) -> bool {
        Utc::now().timestamp_millis() > self.blocked_until_ms.load(Ordering::Relaxed)
    }

    /// Block upstream calls for `cooldown` from now.
    pub fn block(&self, cooldown: Duration) {
        let until = Utc::now().timestamp_millis() + cooldown.as_millis() as i64;
        self.blocked_until_ms.store(until, Ordering::Relaxed);
        info!("Rate guard: upstream blocked for {:?}", cooldown);
    }
}
