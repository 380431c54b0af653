pub mod actions;
pub mod cycle_runner;
pub mod errors;
pub mod models;

// Re-export commonly used types
pub use actions::{FollowUpReport, PairingCycleReport};
pub use cycle_runner::{CycleError, CycleKind, CycleRunner};
pub use errors::MatchingError;
pub use models::{MatchRecord, MatchStatus, PairingHistoryEntry, RosterMember};
