use serde::{Deserialize, Serialize};

/// A person eligible for pairing. `id` is the chat platform user id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RosterMember {
    pub id: String,
    pub name: String,
}

impl RosterMember {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
