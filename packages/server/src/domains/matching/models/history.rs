use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domains::matching::MatchingError;
use crate::kernel::store::{self, StoreError, HISTORY_KEY};
use crate::kernel::BaseStore;

/// One past pairing. Blocks re-pairing the same two members until it expires.
///
/// Stored as `{"pair": ["U1", "U2"], "timestamp": <epoch millis>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingHistoryEntry {
    pub pair: [String; 2],
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl PairingHistoryEntry {
    pub fn new(
        first: impl Into<String>,
        second: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, MatchingError> {
        let (first, second) = (first.into(), second.into());
        if first == second {
            return Err(MatchingError::InvalidPair(format!(
                "{first} cannot be paired with themselves"
            )));
        }

        Ok(Self {
            pair: [first, second],
            timestamp,
        })
    }

    /// Unordered comparison against a member pair
    pub fn involves(&self, a: &str, b: &str) -> bool {
        (self.pair[0] == a && self.pair[1] == b) || (self.pair[0] == b && self.pair[1] == a)
    }

    pub fn is_expired(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.timestamp >= window
    }

    /// Load the full history
    pub async fn find_all(store: &dyn BaseStore) -> Result<Vec<Self>, StoreError> {
        store::load_collection(store, HISTORY_KEY).await
    }

    /// Append this entry and persist immediately
    pub async fn record(&self, store: &dyn BaseStore) -> Result<(), StoreError> {
        let entry = self.clone();
        store::update_collection(store, HISTORY_KEY, move |history: &mut Vec<Self>| {
            history.push(entry)
        })
        .await
    }

    /// Drop every entry older than `window`. Returns how many were removed.
    pub async fn delete_expired(
        window: Duration,
        now: DateTime<Utc>,
        store: &dyn BaseStore,
    ) -> Result<usize, StoreError> {
        store::update_collection(store, HISTORY_KEY, move |history: &mut Vec<Self>| {
            let before = history.len();
            history.retain(|entry| !entry.is_expired(now, window));
            before - history.len()
        })
        .await
    }
}

/// Whether `a` and `b` were paired within the expiration window.
pub fn has_been_matched(
    history: &[PairingHistoryEntry],
    a: &str,
    b: &str,
    now: DateTime<Utc>,
    window: Duration,
) -> bool {
    history
        .iter()
        .any(|entry| entry.involves(a, b) && !entry.is_expired(now, window))
}
