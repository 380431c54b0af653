use tracing::info;

use crate::domains::matching::models::{MatchRecord, MatchStatus};
use crate::domains::matching::MatchingError;
use crate::kernel::BaseStore;

/// Mark an active match as completed. Completed matches drop out of every sweep.
pub async fn complete_match(
    match_id: &str,
    store: &dyn BaseStore,
) -> Result<MatchRecord, MatchingError> {
    let existing = MatchRecord::find_by_id(match_id, store)
        .await?
        .ok_or_else(|| MatchingError::MatchNotFound(match_id.to_string()))?;

    if !existing.status.is_active() {
        return Err(MatchingError::AlreadyCompleted(match_id.to_string()));
    }

    let record = MatchRecord::advance_status(match_id, MatchStatus::Completed, store).await?;
    info!(match_id = %record.id, "Completed match for {}", record.member_names());
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::matching::models::{NewMatch, RosterMember};
    use crate::kernel::store::MemoryStore;
    use chrono::Utc;

    async fn seed(store: &MemoryStore, status: MatchStatus) -> MatchRecord {
        let now = Utc::now();
        let record = MatchRecord::from_new(
            NewMatch {
                pair: [RosterMember::new("U1", "A"), RosterMember::new("U2", "B")],
                status,
                timestamp: now,
            },
            "G1".to_string(),
            now,
        );
        record.insert(store).await.unwrap();
        record
    }

    #[tokio::test]
    async fn completes_an_active_match() {
        let store = MemoryStore::new();
        let record = seed(&store, MatchStatus::ScheduleChecked).await;

        let completed = complete_match(&record.id, &store).await.unwrap();
        assert_eq!(completed.status, MatchStatus::Completed);
        assert!(MatchRecord::find_active(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_completed_and_unknown_matches() {
        let store = MemoryStore::new();
        let record = seed(&store, MatchStatus::Completed).await;

        let err = complete_match(&record.id, &store).await.unwrap_err();
        assert!(matches!(err, MatchingError::AlreadyCompleted(_)));

        let err = complete_match("nope", &store).await.unwrap_err();
        assert!(matches!(err, MatchingError::MatchNotFound(_)));
    }
}
