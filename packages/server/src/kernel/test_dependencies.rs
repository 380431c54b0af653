// TestDependencies - mock implementations for testing
//
// Provides a scripted notifier and an in-memory store that can be injected into
// ServerDeps for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::store::MemoryStore;
use super::{BaseNotifier, NotifierError, NotifierIdentity, ServerDeps};
use crate::config::MatchingConfig;
use crate::domains::matching::models::RosterMember;

// =============================================================================
// Mock Notifier
// =============================================================================

/// A message the mock notifier was asked to deliver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: String,
    pub text: String,
}

#[derive(Default)]
struct MockNotifierState {
    opened: Vec<Vec<String>>,
    sent: Vec<SentMessage>,
    reply_checks: Vec<(String, DateTime<Utc>)>,
    replied_channels: HashSet<String>,
    fail_open_for: HashSet<String>,
    fail_send_to: HashSet<String>,
    fail_reply_check_for: HashSet<String>,
    channels: HashMap<Vec<String>, String>,
    next_channel: usize,
}

/// Notifier double. Channels are named `C0001`, `C0002`, ... in first-open order.
/// Opening the same member set again returns the same channel, as Slack does.
#[derive(Clone, Default)]
pub struct MockNotifier {
    state: Arc<Mutex<MockNotifierState>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend a human replied in this channel
    pub fn with_reply_in(self, channel_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .replied_channels
            .insert(channel_id.to_string());
        self
    }

    /// Hand out `channel_id` whenever these members open a conversation
    pub fn with_channel_for(self, member_ids: &[&str], channel_id: &str) -> Self {
        let members = member_key(member_ids.iter().map(|id| id.to_string()).collect());
        self.state
            .lock()
            .unwrap()
            .channels
            .insert(members, channel_id.to_string());
        self
    }

    /// Fail channel creation for any pair containing this member
    pub fn failing_open_for(self, member_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .fail_open_for
            .insert(member_id.to_string());
        self
    }

    /// Fail every delivery to this channel
    pub fn failing_send_to(self, channel_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .fail_send_to
            .insert(channel_id.to_string());
        self
    }

    /// Fail reply checks for this channel
    pub fn failing_reply_check_for(self, channel_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .fail_reply_check_for
            .insert(channel_id.to_string());
        self
    }

    /// Stop failing deliveries to this channel
    pub fn heal_send_to(&self, channel_id: &str) {
        self.state.lock().unwrap().fail_send_to.remove(channel_id);
    }

    /// Member id lists passed to `open_channel`, in call order
    pub fn opened_channels(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().opened.clone()
    }

    /// All delivered messages, in order
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Delivered message texts for one channel, in order
    pub fn messages_to(&self, channel_id: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .map(|m| m.text.clone())
            .collect()
    }

    /// Channels whose replies were checked, with the `since` instant used
    pub fn reply_checks(&self) -> Vec<(String, DateTime<Utc>)> {
        self.state.lock().unwrap().reply_checks.clone()
    }
}

#[async_trait]
impl BaseNotifier for MockNotifier {
    async fn open_channel(&self, member_ids: &[String]) -> Result<String, NotifierError> {
        let mut state = self.state.lock().unwrap();
        if member_ids.iter().any(|id| state.fail_open_for.contains(id)) {
            return Err(NotifierError::ChannelCreation {
                members: member_ids.to_vec(),
                reason: "mock failure".to_string(),
            });
        }

        state.opened.push(member_ids.to_vec());
        let members = member_key(member_ids.to_vec());
        if let Some(channel_id) = state.channels.get(&members) {
            return Ok(channel_id.clone());
        }

        state.next_channel += 1;
        let channel_id = format!("C{:04}", state.next_channel);
        state.channels.insert(members, channel_id.clone());
        Ok(channel_id)
    }

    async fn send_message(&self, channel_id: &str, text: &str) -> Result<(), NotifierError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_send_to.contains(channel_id) {
            return Err(NotifierError::Delivery {
                channel_id: channel_id.to_string(),
                reason: "mock failure".to_string(),
            });
        }

        state.sent.push(SentMessage {
            channel_id: channel_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn has_reply(
        &self,
        channel_id: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, NotifierError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_reply_check_for.contains(channel_id) {
            return Err(NotifierError::Query {
                channel_id: channel_id.to_string(),
                reason: "mock failure".to_string(),
            });
        }

        state.reply_checks.push((channel_id.to_string(), since));
        Ok(state.replied_channels.contains(channel_id))
    }

    async fn verify_connection(&self) -> Result<NotifierIdentity, NotifierError> {
        Ok(NotifierIdentity {
            user: Some("mock-bot".to_string()),
            team: Some("mock-team".to_string()),
            scopes: vec![
                "mpim:write".to_string(),
                "chat:write".to_string(),
                "im:write".to_string(),
                "users:read".to_string(),
            ],
        })
    }
}

fn member_key(mut member_ids: Vec<String>) -> Vec<String> {
    member_ids.sort();
    member_ids
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Mock services plus the ServerDeps built from them.
pub struct TestDependencies {
    pub store: MemoryStore,
    pub notifier: MockNotifier,
    pub matching: MatchingConfig,
}

impl TestDependencies {
    /// Default templates and timing, roster `U1..Un` named `Member 1..n`.
    pub fn with_roster_size(n: usize) -> Self {
        let roster = (1..=n)
            .map(|i| RosterMember::new(format!("U{i}"), format!("Member {i}")))
            .collect();
        Self::new(MatchingConfig::new(roster))
    }

    pub fn new(matching: MatchingConfig) -> Self {
        Self {
            store: MemoryStore::new(),
            notifier: MockNotifier::new(),
            matching,
        }
    }

    pub fn with_notifier(mut self, notifier: MockNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            Arc::new(self.store.clone()),
            Arc::new(self.notifier.clone()),
            self.matching.clone(),
        )
    }
}
