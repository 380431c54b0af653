//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! ```text
//! Scheduler (PAIRING_CRON, default Monday 09:00)
//!     └─► CycleRunner::run_pairing_cycle()
//!
//! Scheduler (FOLLOW_UP_CRON, default every 6 hours)
//!     └─► CycleRunner::run_follow_up_sweep()
//! ```
//!
//! Both passes go through the same runner as the HTTP triggers, so a manual run and a
//! scheduled run of the same kind never overlap.

use anyhow::{Context, Result};
use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::matching::{CycleError, CycleRunner};

/// Start all scheduled tasks
pub async fn start_scheduler(
    runner: CycleRunner,
    pairing_cron: &str,
    follow_up_cron: &str,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let pairing_runner = runner.clone();
    let pairing_job = Job::new_async(pairing_cron, move |_uuid, _lock| {
        let runner = pairing_runner.clone();
        Box::pin(async move {
            if let Err(e) = run_pairing(&runner).await {
                tracing::error!("Scheduled pairing cycle failed: {:#}", e);
            }
        })
    })
    .with_context(|| format!("invalid pairing schedule {pairing_cron:?}"))?;

    scheduler.add(pairing_job).await?;

    let follow_up_runner = runner;
    let follow_up_job = Job::new_async(follow_up_cron, move |_uuid, _lock| {
        let runner = follow_up_runner.clone();
        Box::pin(async move {
            if let Err(e) = run_follow_ups(&runner).await {
                tracing::error!("Scheduled follow-up sweep failed: {:#}", e);
            }
        })
    })
    .with_context(|| format!("invalid follow-up schedule {follow_up_cron:?}"))?;

    scheduler.add(follow_up_job).await?;
    scheduler.start().await?;

    tracing::info!(
        pairing = pairing_cron,
        follow_ups = follow_up_cron,
        "Scheduled tasks started"
    );
    Ok(scheduler)
}

async fn run_pairing(runner: &CycleRunner) -> Result<()> {
    tracing::info!("Running scheduled pairing cycle");

    match runner.run_pairing_cycle(Utc::now()).await {
        Ok(report) => {
            tracing::info!(
                created = report.created,
                failed = report.failed,
                "Scheduled pairing cycle complete"
            );
            Ok(())
        }
        Err(CycleError::AlreadyRunning(_)) => Ok(()),
        Err(e) => Err(e).context("pairing cycle aborted"),
    }
}

async fn run_follow_ups(runner: &CycleRunner) -> Result<()> {
    tracing::info!("Running scheduled follow-up sweep");

    match runner.run_follow_up_sweep(Utc::now()).await {
        Ok(report) => {
            tracing::info!(
                checked = report.checked,
                failed = report.failed,
                "Scheduled follow-up sweep complete"
            );
            Ok(())
        }
        Err(CycleError::AlreadyRunning(_)) => Ok(()),
        Err(e) => Err(e).context("follow-up sweep aborted"),
    }
}
