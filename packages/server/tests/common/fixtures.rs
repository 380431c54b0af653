//! Test fixtures for creating test data.

use chrono::{DateTime, TimeZone, Utc};
use server_core::domains::matching::models::{MatchRecord, MatchStatus, NewMatch, RosterMember};
use server_core::kernel::BaseStore;

/// Monday 2025-01-06 09:00 UTC, the creation time of seeded matches
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap()
}

/// Persist a match created at `timestamp` in `channel_id`
pub async fn seed_match(
    store: &dyn BaseStore,
    channel_id: &str,
    status: MatchStatus,
    timestamp: DateTime<Utc>,
) -> MatchRecord {
    let suffix = channel_id.trim_start_matches('G');
    let record = MatchRecord::from_new(
        NewMatch {
            pair: [
                RosterMember::new(format!("UA{suffix}"), format!("Alex {suffix}")),
                RosterMember::new(format!("UB{suffix}"), format!("Blair {suffix}")),
            ],
            status,
            timestamp,
        },
        channel_id.to_string(),
        timestamp,
    );
    record
        .insert(store)
        .await
        .expect("Failed to seed match");
    record
}
