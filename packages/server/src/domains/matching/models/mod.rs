pub mod history;
pub mod match_record;
pub mod roster;

pub use history::{has_been_matched, PairingHistoryEntry};
pub use match_record::{MatchRecord, MatchStatus, NewMatch};
pub use roster::RosterMember;
