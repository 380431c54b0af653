//! Cycle runner - the single entry point for scheduled and manual passes
//!
//! Each pass kind owns a guard. A trigger that finds its pass already running is
//! turned away instead of queued, so cron and HTTP triggers never overlap.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

use super::actions::{check_follow_ups, initiate_matches, FollowUpReport, PairingCycleReport};
use super::MatchingError;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    Pairing,
    FollowUp,
}

impl fmt::Display for CycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleKind::Pairing => f.write_str("pairing cycle"),
            CycleKind::FollowUp => f.write_str("follow-up sweep"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CycleError {
    #[error("A {0} is already running")]
    AlreadyRunning(CycleKind),

    #[error(transparent)]
    Matching(#[from] MatchingError),
}

#[derive(Clone)]
pub struct CycleRunner {
    deps: ServerDeps,
    /// Guards the pairing pass and owns its randomness
    pairing: Arc<Mutex<StdRng>>,
    follow_up: Arc<Mutex<()>>,
}

impl CycleRunner {
    pub fn new(deps: ServerDeps) -> Self {
        Self::with_rng(deps, StdRng::from_entropy())
    }

    /// Use a fixed random source (seeded in tests)
    pub fn with_rng(deps: ServerDeps, rng: StdRng) -> Self {
        Self {
            deps,
            pairing: Arc::new(Mutex::new(rng)),
            follow_up: Arc::new(Mutex::new(())),
        }
    }

    pub fn deps(&self) -> &ServerDeps {
        &self.deps
    }

    pub async fn run_pairing_cycle(
        &self,
        now: DateTime<Utc>,
    ) -> Result<PairingCycleReport, CycleError> {
        let Ok(mut rng) = self.pairing.try_lock() else {
            warn!("Pairing cycle already running, skipping trigger");
            return Err(CycleError::AlreadyRunning(CycleKind::Pairing));
        };

        Ok(initiate_matches(now, &mut *rng, &self.deps).await?)
    }

    pub async fn run_follow_up_sweep(
        &self,
        now: DateTime<Utc>,
    ) -> Result<FollowUpReport, CycleError> {
        let Ok(_guard) = self.follow_up.try_lock() else {
            warn!("Follow-up sweep already running, skipping trigger");
            return Err(CycleError::AlreadyRunning(CycleKind::FollowUp));
        };

        Ok(check_follow_ups(now, &self.deps).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::TestDependencies;

    #[tokio::test]
    async fn rejects_overlapping_pairing_passes() {
        let test_deps = TestDependencies::with_roster_size(4);
        let runner = CycleRunner::with_rng(test_deps.server_deps(), StdRng::seed_from_u64(1));

        let held = runner.pairing.clone();
        let _guard = held.lock().await;

        let err = runner.run_pairing_cycle(Utc::now()).await.unwrap_err();
        assert!(matches!(err, CycleError::AlreadyRunning(CycleKind::Pairing)));

        // The other pass kind is unaffected
        runner.run_follow_up_sweep(Utc::now()).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_overlapping_follow_up_sweeps() {
        let test_deps = TestDependencies::with_roster_size(2);
        let runner = CycleRunner::with_rng(test_deps.server_deps(), StdRng::seed_from_u64(1));

        let held = runner.follow_up.clone();
        let _guard = held.lock().await;

        let err = runner.run_follow_up_sweep(Utc::now()).await.unwrap_err();
        assert!(matches!(err, CycleError::AlreadyRunning(CycleKind::FollowUp)));
    }
}
