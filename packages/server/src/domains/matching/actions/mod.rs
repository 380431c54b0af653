//! Matching domain actions - entry-point business logic
//!
//! Called from the cycle runner (cron and HTTP triggers) and the HTTP routes.

pub mod check_follow_ups;
pub mod cleanup_history;
pub mod complete_match;
pub mod generate_matches;
pub mod initiate_matches;

pub use check_follow_ups::{check_follow_ups, FollowUpReport};
pub use cleanup_history::cleanup_expired;
pub use complete_match::complete_match;
pub use generate_matches::{generate_matches, PairingOutcome};
pub use initiate_matches::{initiate_matches, PairingCycleReport};
