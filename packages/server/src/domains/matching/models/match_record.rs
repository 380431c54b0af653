use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RosterMember;
use crate::domains::matching::MatchingError;
use crate::kernel::store::{self, StoreError, MATCHES_KEY};
use crate::kernel::BaseStore;

/// Lifecycle position of a match. Variants are declared in lifecycle order, so the
/// derived `Ord` is the only allowed direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    FollowedUp,
    ScheduleChecked,
    CompletionChecked,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::FollowedUp => "followed_up",
            MatchStatus::ScheduleChecked => "schedule_checked",
            MatchStatus::CompletionChecked => "completion_checked",
            MatchStatus::Completed => "completed",
        }
    }

    /// Everything except `completed` is active
    pub fn is_active(&self) -> bool {
        *self != MatchStatus::Completed
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pair produced by the pairing engine, before a channel exists for it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMatch {
    pub pair: [RosterMember; 2],
    pub status: MatchStatus,
    pub timestamp: DateTime<Utc>,
}

impl NewMatch {
    pub fn member_ids(&self) -> Vec<String> {
        self.pair.iter().map(|m| m.id.clone()).collect()
    }

    pub fn member_names(&self) -> String {
        format!("{} and {}", self.pair[0].name, self.pair[1].name)
    }
}

/// Match record - persisted under the `matches` key.
///
/// `timestamp` is the creation instant used as the origin for all follow-up timing
/// (epoch millis on the wire); `created_at` is audit metadata (RFC 3339).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: String,
    pub pair: [RosterMember; 2],
    pub channel_id: String,
    pub status: MatchStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    /// Attach a freshly opened channel to a generated pair
    pub fn from_new(new_match: NewMatch, channel_id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            pair: new_match.pair,
            channel_id,
            status: new_match.status,
            timestamp: new_match.timestamp,
            created_at,
        }
    }

    pub fn member_names(&self) -> String {
        format!("{} and {}", self.pair[0].name, self.pair[1].name)
    }

    /// Find all matches in storage order
    pub async fn find_all(store: &dyn BaseStore) -> Result<Vec<Self>, StoreError> {
        store::load_collection(store, MATCHES_KEY).await
    }

    /// Find all matches that are not completed, in storage order
    pub async fn find_active(store: &dyn BaseStore) -> Result<Vec<Self>, StoreError> {
        let matches = Self::find_all(store).await?;
        Ok(matches.into_iter().filter(|m| m.status.is_active()).collect())
    }

    /// Find match by ID
    pub async fn find_by_id(id: &str, store: &dyn BaseStore) -> Result<Option<Self>, StoreError> {
        let matches = Self::find_all(store).await?;
        Ok(matches.into_iter().find(|m| m.id == id))
    }

    /// Append a new match.
    ///
    /// The chat platform hands back the same conversation for the same pair of people,
    /// so an active match still holding this channel is from an earlier pairing. It is
    /// completed in the same update and its id returned.
    pub async fn insert(&self, store: &dyn BaseStore) -> Result<Option<String>, StoreError> {
        let record = self.clone();
        store::update_collection(store, MATCHES_KEY, move |matches: &mut Vec<Self>| {
            let superseded = matches
                .iter_mut()
                .find(|m| m.status.is_active() && m.channel_id == record.channel_id)
                .map(|stale| {
                    stale.status = MatchStatus::Completed;
                    stale.id.clone()
                });
            matches.push(record);
            superseded
        })
        .await
    }

    /// Move a match forward to `status`.
    ///
    /// Setting the current status again is a no-op; moving backwards is rejected.
    pub async fn advance_status(
        id: &str,
        status: MatchStatus,
        store: &dyn BaseStore,
    ) -> Result<Self, MatchingError> {
        let id = id.to_string();
        store::update_collection(store, MATCHES_KEY, move |matches: &mut Vec<Self>| {
            let record = matches
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or_else(|| MatchingError::MatchNotFound(id.clone()))?;

            if status < record.status {
                return Err(MatchingError::StatusRegression {
                    match_id: id.clone(),
                    from: record.status,
                    to: status,
                });
            }

            record.status = status;
            Ok(record.clone())
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::store::MemoryStore;
    use chrono::TimeZone;

    fn record(channel_id: &str, status: MatchStatus) -> MatchRecord {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap();
        MatchRecord::from_new(
            NewMatch {
                pair: [
                    RosterMember::new("U1", "Craig Dennis"),
                    RosterMember::new("U2", "Alex King"),
                ],
                status,
                timestamp: t0,
            },
            channel_id.to_string(),
            t0,
        )
    }

    #[test]
    fn status_order_follows_lifecycle() {
        assert!(MatchStatus::Pending < MatchStatus::FollowedUp);
        assert!(MatchStatus::FollowedUp < MatchStatus::ScheduleChecked);
        assert!(MatchStatus::ScheduleChecked < MatchStatus::CompletionChecked);
        assert!(MatchStatus::CompletionChecked < MatchStatus::Completed);
        assert!(!MatchStatus::Completed.is_active());
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let json = serde_json::to_value(record("G1", MatchStatus::FollowedUp)).unwrap();
        assert_eq!(json["channelId"], "G1");
        assert_eq!(json["status"], "followed_up");
        assert_eq!(json["timestamp"], 1736154000000i64);
        assert!(json["createdAt"].is_string());
    }

    #[test]
    fn reads_records_with_extra_fields() {
        let json = serde_json::json!({
            "id": "1736154000000",
            "pair": [{"id": "U1", "name": "A"}, {"id": "U2", "name": "B"}],
            "channelId": "G1",
            "status": "pending",
            "timestamp": 1736154000000i64,
            "createdAt": "2025-01-06T09:00:00.000Z",
            "lastChecked": "2025-01-06T09:00:00.000Z"
        });
        let parsed: MatchRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.id, "1736154000000");
        assert_eq!(parsed.status, MatchStatus::Pending);
    }

    #[tokio::test]
    async fn find_active_excludes_completed() {
        let store = MemoryStore::new();
        record("G1", MatchStatus::Pending).insert(&store).await.unwrap();
        record("G2", MatchStatus::Completed).insert(&store).await.unwrap();
        record("G3", MatchStatus::CompletionChecked)
            .insert(&store)
            .await
            .unwrap();

        let active = MatchRecord::find_active(&store).await.unwrap();
        let channels: Vec<_> = active.iter().map(|m| m.channel_id.as_str()).collect();
        assert_eq!(channels, vec!["G1", "G3"]);
        assert_eq!(MatchRecord::find_all(&store).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn insert_completes_active_match_holding_the_channel() {
        let store = MemoryStore::new();
        let earlier = record("G1", MatchStatus::CompletionChecked);
        assert_eq!(earlier.insert(&store).await.unwrap(), None);

        let later = record("G1", MatchStatus::Pending);
        let superseded = later.insert(&store).await.unwrap();
        assert_eq!(superseded.as_deref(), Some(earlier.id.as_str()));

        let active = MatchRecord::find_active(&store).await.unwrap();
        assert_eq!(active, vec![later]);
        let stored = MatchRecord::find_by_id(&earlier.id, &store)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, MatchStatus::Completed);

        // A completed match in the same channel is left alone
        let store = MemoryStore::new();
        record("G1", MatchStatus::Completed).insert(&store).await.unwrap();
        assert_eq!(
            record("G1", MatchStatus::Pending).insert(&store).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn advance_status_never_regresses() {
        let store = MemoryStore::new();
        let created = record("G1", MatchStatus::Pending);
        created.insert(&store).await.unwrap();

        let updated =
            MatchRecord::advance_status(&created.id, MatchStatus::CompletionChecked, &store)
                .await
                .unwrap();
        assert_eq!(updated.status, MatchStatus::CompletionChecked);

        let err = MatchRecord::advance_status(&created.id, MatchStatus::ScheduleChecked, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, MatchingError::StatusRegression { .. }));

        let stored = MatchRecord::find_by_id(&created.id, &store)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, MatchStatus::CompletionChecked);
    }

    #[tokio::test]
    async fn advance_status_unknown_match() {
        let store = MemoryStore::new();
        let err = MatchRecord::advance_status("missing", MatchStatus::FollowedUp, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, MatchingError::MatchNotFound(_)));
    }
}
