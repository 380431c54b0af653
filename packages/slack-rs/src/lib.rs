// Minimal Slack Web API client: just the methods the matcher needs.
// https://api.slack.com/methods

use std::time::Duration;

pub mod models;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;

use crate::models::{
    AuthIdentity, AuthTestResponse, ConversationsHistoryResponse, ConversationsOpenResponse,
    HistoryMessage, PostMessageResponse,
};

pub const DEFAULT_BASE_URL: &str = "https://slack.com/api";

#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    #[error("request to Slack failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Slack answered with `ok: false`.
    #[error("Slack {method} returned error: {error}")]
    Api { method: &'static str, error: String },

    #[error("Slack {method} response missing {field}")]
    MissingField {
        method: &'static str,
        field: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct SlackOptions {
    pub bot_token: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl SlackOptions {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct SlackService {
    options: SlackOptions,
    client: Client,
}

impl SlackService {
    pub fn new(options: SlackOptions) -> Result<Self, SlackError> {
        let client = Client::builder().timeout(options.timeout).build()?;
        Ok(Self { options, client })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.options.base_url.trim_end_matches('/'), method)
    }

    /// Check the token and report who we are plus the granted scopes.
    pub async fn auth_test(&self) -> Result<AuthIdentity, SlackError> {
        let response = self
            .client
            .post(self.url("auth.test"))
            .bearer_auth(&self.options.bot_token)
            .send()
            .await?
            .error_for_status()?;

        let scopes = response
            .headers()
            .get("x-oauth-scopes")
            .and_then(|v| v.to_str().ok())
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let body: AuthTestResponse = response.json().await?;
        if !body.ok {
            return Err(api_error("auth.test", body.error));
        }

        Ok(AuthIdentity {
            user: body.user,
            user_id: body.user_id,
            team: body.team,
            scopes,
        })
    }

    /// Open (or reuse) a multi-person DM with the given users. Returns the channel id.
    pub async fn open_conversation(&self, user_ids: &[&str]) -> Result<String, SlackError> {
        let body = serde_json::json!({
            "users": user_ids.join(","),
            "return_im": false,
        });

        let response: ConversationsOpenResponse =
            self.post_json("conversations.open", &body).await?;
        if !response.ok {
            return Err(api_error("conversations.open", response.error));
        }

        response
            .channel
            .map(|c| c.id)
            .ok_or(SlackError::MissingField {
                method: "conversations.open",
                field: "channel",
            })
    }

    /// Post a plain-text message. Returns the message timestamp.
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<String, SlackError> {
        let body = serde_json::json!({
            "channel": channel,
            "text": text,
        });

        let response: PostMessageResponse = self.post_json("chat.postMessage", &body).await?;
        if !response.ok {
            return Err(api_error("chat.postMessage", response.error));
        }

        response.ts.ok_or(SlackError::MissingField {
            method: "chat.postMessage",
            field: "ts",
        })
    }

    /// Messages posted after `oldest` (a Slack timestamp such as `"1700000000.000000"`).
    ///
    /// Only the first page is fetched.
    pub async fn conversation_history(
        &self,
        channel: &str,
        oldest: &str,
    ) -> Result<Vec<HistoryMessage>, SlackError> {
        let response = self
            .client
            .get(self.url("conversations.history"))
            .bearer_auth(&self.options.bot_token)
            .query(&[("channel", channel), ("oldest", oldest), ("limit", "200")])
            .send()
            .await?
            .error_for_status()?;

        let body: ConversationsHistoryResponse = response.json().await?;
        if !body.ok {
            return Err(api_error("conversations.history", body.error));
        }
        if body.has_more {
            tracing::debug!(channel, "conversation history truncated to first page");
        }

        Ok(body.messages)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        method: &'static str,
        body: &serde_json::Value,
    ) -> Result<T, SlackError> {
        let response = self
            .client
            .post(self.url(method))
            .bearer_auth(&self.options.bot_token)
            .header(header::CONTENT_TYPE, "application/json; charset=utf-8")
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<T>().await?)
    }
}

fn api_error(method: &'static str, error: Option<String>) -> SlackError {
    SlackError::Api {
        method,
        error: error.unwrap_or_else(|| "unknown_error".to_string()),
    }
}
