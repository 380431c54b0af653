//! Vercel Edge Config backend.
//!
//! Reads go to the Edge Config endpoint named by the connection string
//! (`https://edge-config.vercel.com/ecfg_xxx?token=...`); writes go through the
//! Vercel REST API with an API token. Edge Config has no compare-and-swap, so this
//! backend keeps the default last-writer-wins `modify`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

use super::StoreError;
use crate::kernel::BaseStore;

pub const VERCEL_API_BASE: &str = "https://api.vercel.com";

#[derive(Debug, Clone)]
pub struct EdgeConfigStore {
    client: Client,
    read_base: Url,
    read_token: String,
    config_id: String,
    api_base: String,
    api_token: String,
}

impl EdgeConfigStore {
    /// Build from the `EDGE_CONFIG` connection string and a `VERCEL_API_TOKEN`.
    pub fn new(connection_string: &str, api_token: impl Into<String>) -> Result<Self, StoreError> {
        let url = Url::parse(connection_string)
            .map_err(|e| StoreError::Backend(format!("invalid Edge Config URL: {e}")))?;

        let config_id = url
            .path_segments()
            .and_then(|mut segments| segments.find(|s| s.starts_with("ecfg_")))
            .map(str::to_string)
            .ok_or_else(|| {
                StoreError::Backend("unable to extract Edge Config id from URL".to_string())
            })?;

        let read_token = url
            .query_pairs()
            .find(|(k, _)| k == "token")
            .map(|(_, v)| v.into_owned())
            .ok_or_else(|| StoreError::Backend("Edge Config URL has no token".to_string()))?;

        let mut read_base = url.clone();
        read_base.set_query(None);

        Ok(Self {
            client: Client::new(),
            read_base,
            read_token,
            config_id,
            api_base: VERCEL_API_BASE.to_string(),
            api_token: api_token.into(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn config_id(&self) -> &str {
        &self.config_id
    }

    fn item_url(&self, key: &str) -> String {
        format!(
            "{}/item/{}",
            self.read_base.as_str().trim_end_matches('/'),
            key
        )
    }
}

#[async_trait]
impl BaseStore for EdgeConfigStore {
    fn backend(&self) -> &'static str {
        "edge_config"
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let response = self
            .client
            .get(self.item_url(key))
            .bearer_auth(&self.read_token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = response.error_for_status()?;
        Ok(Some(response.json::<Value>().await?))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let url = format!(
            "{}/v1/edge-config/{}/items",
            self.api_base.trim_end_matches('/'),
            self.config_id
        );

        let response = self
            .client
            .patch(url)
            .bearer_auth(&self.api_token)
            .json(&serde_json::json!({
                "items": [
                    { "operation": "upsert", "key": key, "value": value }
                ]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend(format!(
                "failed to set Edge Config key {key}: {status} {body}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_connection_string() {
        let store = EdgeConfigStore::new(
            "https://edge-config.vercel.com/ecfg_abc123?token=read-token",
            "api-token",
        )
        .unwrap();

        assert_eq!(store.config_id(), "ecfg_abc123");
        assert_eq!(store.read_token, "read-token");
        assert_eq!(
            store.item_url("matches"),
            "https://edge-config.vercel.com/ecfg_abc123/item/matches"
        );
    }

    #[test]
    fn rejects_url_without_config_id() {
        let err = EdgeConfigStore::new("https://edge-config.vercel.com/?token=t", "api").unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn rejects_url_without_token() {
        let err = EdgeConfigStore::new("https://edge-config.vercel.com/ecfg_abc", "api").unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
