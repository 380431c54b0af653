// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Pairing and follow-up logic lives in domains/matching and only talks to these traits.
//
// Naming convention: Base* for trait names (e.g., BaseStore, BaseNotifier)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::kernel::store::StoreError;

// =============================================================================
// Store Trait (Infrastructure - durable key/value collections)
// =============================================================================

/// Closure applied by [`BaseStore::modify`] to the current value of a key.
pub type StoreModifier<'a> =
    &'a mut (dyn FnMut(Option<Value>) -> Result<Value, StoreError> + Send);

#[async_trait]
pub trait BaseStore: Send + Sync {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Read a key. Returns `None` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Overwrite a key with a JSON value
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Read-modify-write a single key, returning the value that was written.
    ///
    /// The default is a plain get followed by set (last writer wins). Backends that
    /// can lock or compare-and-swap override this to make the update atomic.
    async fn modify(&self, key: &str, f: StoreModifier<'_>) -> Result<Value, StoreError> {
        let current = self.get(key).await?;
        let next = f(current)?;
        self.set(key, next.clone()).await?;
        Ok(next)
    }

    /// Connectivity probe used by the health endpoint
    async fn ping(&self) -> Result<(), StoreError> {
        self.get(crate::kernel::store::MATCHES_KEY).await.map(|_| ())
    }
}

// =============================================================================
// Notifier Trait (Infrastructure - chat platform)
// =============================================================================

/// Chat platform failures. All of them are scoped to one match and retried by the
/// next cycle.
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("failed to open channel for {members:?}: {reason}")]
    ChannelCreation { members: Vec<String>, reason: String },

    #[error("failed to deliver message to {channel_id}: {reason}")]
    Delivery { channel_id: String, reason: String },

    #[error("failed to read replies in {channel_id}: {reason}")]
    Query { channel_id: String, reason: String },

    #[error("chat platform connection failed: {0}")]
    Connection(String),
}

/// Who the notifier is connected as
#[derive(Debug, Clone)]
pub struct NotifierIdentity {
    pub user: Option<String>,
    pub team: Option<String>,
    pub scopes: Vec<String>,
}

#[async_trait]
pub trait BaseNotifier: Send + Sync {
    /// Open a group conversation for the given member ids. Returns the channel id.
    async fn open_channel(&self, member_ids: &[String]) -> Result<String, NotifierError>;

    /// Post a message into a channel
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<(), NotifierError>;

    /// True iff a non-automated message was posted in the channel after `since`
    async fn has_reply(&self, channel_id: &str, since: DateTime<Utc>)
        -> Result<bool, NotifierError>;

    /// Verify credentials and report the connected identity
    async fn verify_connection(&self) -> Result<NotifierIdentity, NotifierError>;
}
