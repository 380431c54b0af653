//! Pairing engine - random pairs that avoid recent repeats

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::domains::matching::models::{
    has_been_matched, MatchStatus, NewMatch, PairingHistoryEntry, RosterMember,
};
use crate::domains::matching::MatchingError;
use crate::kernel::BaseStore;

/// Result of one pairing run
#[derive(Debug, Clone, Default)]
pub struct PairingOutcome {
    pub matches: Vec<NewMatch>,
    /// Members left without a partner this cycle
    pub unmatched: Vec<RosterMember>,
}

/// Pair up the roster for this cycle.
///
/// Draws a random member, then a random partner among the remaining members they
/// have not been paired with inside `window`. Every produced pair is appended to the
/// history and persisted before the next draw, so later pairs in the same run see it.
///
/// A member with no eligible partner is set aside for this cycle. Eligibility is
/// symmetric and the pool only shrinks, so that member could never be paired later
/// in the same run; setting them aside keeps the loop bounded by the roster size.
pub async fn generate_matches<R>(
    roster: &[RosterMember],
    window: Duration,
    now: DateTime<Utc>,
    rng: &mut R,
    store: &dyn BaseStore,
) -> Result<PairingOutcome, MatchingError>
where
    R: Rng + Send,
{
    let mut history = PairingHistoryEntry::find_all(store).await?;
    let mut pool: Vec<RosterMember> = roster.to_vec();
    let mut outcome = PairingOutcome::default();

    while pool.len() >= 2 {
        let first = pool.remove(rng.gen_range(0..pool.len()));

        let eligible: Vec<usize> = pool
            .iter()
            .enumerate()
            .filter(|(_, candidate)| {
                !has_been_matched(&history, &first.id, &candidate.id, now, window)
            })
            .map(|(index, _)| index)
            .collect();

        let Some(&partner_index) = eligible.choose(rng) else {
            debug!(member_id = %first.id, "No eligible partner left, skipping this cycle");
            outcome.unmatched.push(first);
            continue;
        };
        let second = pool.remove(partner_index);

        let entry = PairingHistoryEntry::new(first.id.clone(), second.id.clone(), now)?;
        entry.record(store).await?;
        history.push(entry);

        debug!("Paired {} with {}", first.name, second.name);
        outcome.matches.push(NewMatch {
            pair: [first, second],
            status: MatchStatus::Pending,
            timestamp: now,
        });
    }

    if let Some(leftover) = pool.pop() {
        debug!(member_id = %leftover.id, "Odd member out this cycle");
        outcome.unmatched.push(leftover);
    }

    info!(
        matches = outcome.matches.len(),
        unmatched = outcome.unmatched.len(),
        "Generated matches"
    );
    Ok(outcome)
}
