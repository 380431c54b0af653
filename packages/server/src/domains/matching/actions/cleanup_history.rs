use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::domains::matching::models::PairingHistoryEntry;
use crate::domains::matching::MatchingError;
use crate::kernel::BaseStore;

/// Expiration sweep over the pairing history. Idempotent.
pub async fn cleanup_expired(
    window: Duration,
    now: DateTime<Utc>,
    store: &dyn BaseStore,
) -> Result<usize, MatchingError> {
    let removed = PairingHistoryEntry::delete_expired(window, now, store).await?;

    if removed > 0 {
        info!(removed, "Removed expired pairing history entries");
    } else {
        debug!("No expired pairing history entries");
    }

    Ok(removed)
}
