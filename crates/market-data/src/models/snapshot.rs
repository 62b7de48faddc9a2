use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::quote::Quote;

/// The cached quote sequence for one market plus its capture time.
///
/// All quotes in a snapshot share the same market. `captured_at` is
/// stamped at construction, so it is monotonically non-decreasing
/// across writes for a given cache key.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// When the quotes were captured
    pub captured_at: DateTime<Utc>,

    /// Quotes for one market, in configured symbol order
    pub quotes: Vec<Quote>,
}

impl Snapshot {
    /// Create a snapshot captured now.
    pub fn now(quotes: Vec<Quote>) -> Self {
        Self::captured(Utc::now(), quotes)
    }

    /// Create a snapshot with an explicit capture time.
    pub fn captured(captured_at: DateTime<Utc>, quotes: Vec<Quote>) -> Self {
        Self {
            captured_at,
            quotes,
        }
    }

    /// Age of this snapshot at `now`. Clamped to zero for clock skew.
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.captured_at).max(chrono::Duration::zero())
    }
}
