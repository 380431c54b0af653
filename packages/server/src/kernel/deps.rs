//! Server dependencies for domain actions (using traits for testability)
//!
//! This module provides the central dependency container used by the matching
//! domain. External services sit behind trait abstractions so tests can swap them.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slack::SlackService;

use crate::config::MatchingConfig;
use crate::kernel::{BaseNotifier, BaseStore, NotifierError, NotifierIdentity};

// =============================================================================
// SlackService Adapter (implements BaseNotifier trait)
// =============================================================================

/// Wrapper around SlackService that implements BaseNotifier trait
pub struct SlackAdapter(pub Arc<SlackService>);

impl SlackAdapter {
    pub fn new(service: Arc<SlackService>) -> Self {
        Self(service)
    }
}

/// Slack timestamps are `<seconds>.<micros>` strings
fn slack_timestamp(instant: DateTime<Utc>) -> String {
    format!(
        "{}.{:06}",
        instant.timestamp(),
        instant.timestamp_subsec_micros()
    )
}

#[async_trait]
impl BaseNotifier for SlackAdapter {
    async fn open_channel(&self, member_ids: &[String]) -> Result<String, NotifierError> {
        let users: Vec<&str> = member_ids.iter().map(String::as_str).collect();
        self.0
            .open_conversation(&users)
            .await
            .map_err(|e| NotifierError::ChannelCreation {
                members: member_ids.to_vec(),
                reason: e.to_string(),
            })
    }

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<(), NotifierError> {
        self.0
            .post_message(channel_id, text)
            .await
            .map(|_| ())
            .map_err(|e| NotifierError::Delivery {
                channel_id: channel_id.to_string(),
                reason: e.to_string(),
            })
    }

    async fn has_reply(
        &self,
        channel_id: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, NotifierError> {
        let messages = self
            .0
            .conversation_history(channel_id, &slack_timestamp(since))
            .await
            .map_err(|e| NotifierError::Query {
                channel_id: channel_id.to_string(),
                reason: e.to_string(),
            })?;

        Ok(messages.iter().any(|m| !m.is_automated()))
    }

    async fn verify_connection(&self) -> Result<NotifierIdentity, NotifierError> {
        let identity = self
            .0
            .auth_test()
            .await
            .map_err(|e| NotifierError::Connection(e.to_string()))?;

        Ok(NotifierIdentity {
            user: identity.user,
            team: identity.team,
            scopes: identity.scopes,
        })
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to domain actions (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn BaseStore>,
    pub notifier: Arc<dyn BaseNotifier>,
    /// Roster, message templates and follow-up timing
    pub matching: Arc<MatchingConfig>,
}

impl ServerDeps {
    pub fn new(
        store: Arc<dyn BaseStore>,
        notifier: Arc<dyn BaseNotifier>,
        matching: MatchingConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            matching: Arc::new(matching),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_slack_timestamps() {
        let instant = Utc.timestamp_millis_opt(1736154000123).unwrap();
        assert_eq!(slack_timestamp(instant), "1736154000.123000");
    }
}
