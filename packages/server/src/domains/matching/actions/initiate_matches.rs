//! Pairing cycle - expire history, pair the roster, open a channel per pair

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{error, info};

use super::{cleanup_expired, generate_matches};
use crate::config::MessageKind;
use crate::domains::matching::models::{MatchRecord, NewMatch};
use crate::domains::matching::MatchingError;
use crate::kernel::ServerDeps;

/// Summary of one pairing cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingCycleReport {
    pub expired_history: usize,
    pub generated: usize,
    pub created: usize,
    pub failed: usize,
    /// Member ids left without a partner
    pub unmatched: Vec<String>,
}

/// Run a full pairing cycle.
///
/// History cleanup and pair generation touch shared state, so their store failures
/// abort the cycle. Each generated pair is then handled on its own: a failure to open
/// the channel, deliver the intro, or persist the record is logged and counted, and
/// the batch moves on. A failed pair is not persisted and is not retried.
pub async fn initiate_matches<R>(
    now: DateTime<Utc>,
    rng: &mut R,
    deps: &ServerDeps,
) -> Result<PairingCycleReport, MatchingError>
where
    R: Rng + Send,
{
    let window = deps.matching.timing.match_expiration;
    let store = deps.store.as_ref();

    let expired_history = cleanup_expired(window, now, store).await?;
    let outcome = generate_matches(&deps.matching.roster, window, now, rng, store).await?;

    let mut report = PairingCycleReport {
        expired_history,
        generated: outcome.matches.len(),
        unmatched: outcome.unmatched.iter().map(|m| m.id.clone()).collect(),
        ..Default::default()
    };

    for new_match in outcome.matches {
        let members = new_match.member_names();
        match create_match(new_match, now, deps).await {
            Ok(record) => {
                info!(
                    match_id = %record.id,
                    channel_id = %record.channel_id,
                    "Created match for {}",
                    members
                );
                report.created += 1;
            }
            Err(e) => {
                error!(error = %e, "Failed to create match for {}", members);
                report.failed += 1;
            }
        }
    }

    info!(
        generated = report.generated,
        created = report.created,
        failed = report.failed,
        unmatched = report.unmatched.len(),
        "Pairing cycle finished"
    );
    Ok(report)
}

/// Open the group conversation, send the intro, and persist the match.
///
/// Reopening a pair's conversation yields their old channel; any match from that
/// earlier pairing still active there is completed by the insert.
async fn create_match(
    new_match: NewMatch,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<MatchRecord, MatchingError> {
    let channel_id = deps
        .notifier
        .open_channel(&new_match.member_ids())
        .await?;

    deps.notifier
        .send_message(&channel_id, deps.matching.messages.text(MessageKind::Initial))
        .await?;

    let record = MatchRecord::from_new(new_match, channel_id, now);
    if let Some(previous) = record.insert(deps.store.as_ref()).await? {
        info!(
            match_id = %previous,
            channel_id = %record.channel_id,
            "Completed earlier match in reused channel"
        );
    }
    Ok(record)
}
