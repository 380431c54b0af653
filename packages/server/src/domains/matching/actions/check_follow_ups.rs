//! Follow-up sweep - time-based lifecycle transitions for active matches

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::MessageKind;
use crate::domains::matching::models::{MatchRecord, MatchStatus};
use crate::domains::matching::MatchingError;
use crate::kernel::ServerDeps;

/// Summary of one follow-up sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpReport {
    pub checked: usize,
    pub follow_ups: usize,
    pub schedule_checks: usize,
    pub completion_checks: usize,
    pub failed: usize,
}

impl FollowUpReport {
    fn count(&mut self, status: MatchStatus) {
        match status {
            MatchStatus::FollowedUp => self.follow_ups += 1,
            MatchStatus::ScheduleChecked => self.schedule_checks += 1,
            MatchStatus::CompletionChecked => self.completion_checks += 1,
            MatchStatus::Pending | MatchStatus::Completed => {}
        }
    }
}

/// Walk every active match and send whatever check-in is due.
///
/// Loading the active matches is shared state and propagates; everything after that
/// is isolated per match. A failed step leaves the match at its last persisted status
/// so the next sweep picks it up again.
pub async fn check_follow_ups(
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<FollowUpReport, MatchingError> {
    let active = MatchRecord::find_active(deps.store.as_ref()).await?;
    let mut report = FollowUpReport::default();

    for record in active {
        report.checked += 1;
        if let Err(e) = advance_match(&record, now, deps, &mut report).await {
            warn!(
                match_id = %record.id,
                channel_id = %record.channel_id,
                error = %e,
                "Follow-up checks failed for {}",
                record.member_names()
            );
            report.failed += 1;
        }
    }

    info!(
        checked = report.checked,
        follow_ups = report.follow_ups,
        schedule_checks = report.schedule_checks,
        completion_checks = report.completion_checks,
        failed = report.failed,
        "Follow-up sweep finished"
    );
    Ok(report)
}

/// Evaluate the three checks in order against the status produced so far.
async fn advance_match(
    record: &MatchRecord,
    now: DateTime<Utc>,
    deps: &ServerDeps,
    report: &mut FollowUpReport,
) -> Result<(), MatchingError> {
    let timing = &deps.matching.timing;
    let elapsed = now - record.timestamp;
    let mut status = record.status;

    if elapsed >= timing.initial_follow_up && status == MatchStatus::Pending {
        let replied = deps
            .notifier
            .has_reply(&record.channel_id, record.timestamp)
            .await?;

        if replied {
            debug!(match_id = %record.id, "Conversation already started, skipping follow-up");
        } else {
            let Some(next) = transition(record, MatchStatus::FollowedUp, deps).await? else {
                return Ok(());
            };
            status = next;
            report.count(status);
        }
    }

    let checks = [
        (timing.schedule_check, MatchStatus::ScheduleChecked),
        (timing.completion_check, MatchStatus::CompletionChecked),
    ];
    for (delay, target) in checks {
        if is_due(elapsed, delay, status, target) {
            let Some(next) = transition(record, target, deps).await? else {
                return Ok(());
            };
            status = next;
            report.count(status);
        }
    }

    Ok(())
}

fn is_due(elapsed: Duration, delay: Duration, status: MatchStatus, target: MatchStatus) -> bool {
    elapsed >= delay && status < target
}

fn message_for(target: MatchStatus) -> Option<MessageKind> {
    match target {
        MatchStatus::FollowedUp => Some(MessageKind::FollowUp),
        MatchStatus::ScheduleChecked => Some(MessageKind::ScheduleCheck),
        MatchStatus::CompletionChecked => Some(MessageKind::CompletionCheck),
        MatchStatus::Pending | MatchStatus::Completed => None,
    }
}

/// Deliver the message for `target`, then persist the new status.
///
/// The stored record is read again first. If it has already reached `target` or been
/// completed since the sweep loaded it, nothing is sent and `None` is returned.
async fn transition(
    record: &MatchRecord,
    target: MatchStatus,
    deps: &ServerDeps,
) -> Result<Option<MatchStatus>, MatchingError> {
    let store = deps.store.as_ref();
    let current = MatchRecord::find_by_id(&record.id, store)
        .await?
        .ok_or_else(|| MatchingError::MatchNotFound(record.id.clone()))?;
    if current.status >= target {
        debug!(
            match_id = %record.id,
            status = %current.status,
            "Match moved on since the sweep started, skipping"
        );
        return Ok(None);
    }

    if let Some(kind) = message_for(target) {
        deps.notifier
            .send_message(&record.channel_id, deps.matching.messages.text(kind))
            .await?;
    }

    let updated = MatchRecord::advance_status(&record.id, target, store).await?;
    info!(
        match_id = %record.id,
        channel_id = %record.channel_id,
        status = %updated.status,
        "Sent check-in to {}",
        record.member_names()
    );
    Ok(Some(updated.status))
}
