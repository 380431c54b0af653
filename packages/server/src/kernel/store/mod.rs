//! Durable key/value stores for the matcher's collections.
//!
//! Every collection is a JSON array stored under one key. Mutations read the full
//! array, change it, and write it back through [`BaseStore::modify`], so backends that
//! can lock a key (Postgres, memory) make the update atomic.

mod edge_config;
mod error;
mod memory;
mod postgres;

pub use edge_config::EdgeConfigStore;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;

use crate::config::StoreConfig;
use crate::kernel::BaseStore;

/// Key holding the list of match records
pub const MATCHES_KEY: &str = "matches";

/// Key holding the pairing history
pub const HISTORY_KEY: &str = "previousMatches";

/// Keys seeded by `init_store`
pub const COLLECTION_KEYS: [&str; 2] = [MATCHES_KEY, HISTORY_KEY];

/// Connect to the configured backend. Postgres runs pending migrations first.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn BaseStore>> {
    match config {
        StoreConfig::Postgres { database_url } => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
                .context("Failed to connect to database")?;

            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;

            Ok(Arc::new(PostgresStore::new(pool)))
        }
        StoreConfig::EdgeConfig {
            connection_string,
            api_token,
        } => {
            let store = EdgeConfigStore::new(connection_string, api_token.clone())
                .context("Invalid EDGE_CONFIG connection string")?;
            tracing::info!(config_id = store.config_id(), "Using Edge Config store");
            Ok(Arc::new(store))
        }
        StoreConfig::Memory => {
            tracing::warn!("Using in-memory store: matches and history are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: Option<Value>) -> Result<Vec<T>, StoreError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_json::from_value(value).map_err(|e| StoreError::serialization(key, e)),
    }
}

/// Load a whole collection. A missing key reads as an empty list.
pub async fn load_collection<T: DeserializeOwned>(
    store: &dyn BaseStore,
    key: &str,
) -> Result<Vec<T>, StoreError> {
    let value = store.get(key).await?;
    decode(key, value)
}

/// Read-modify-write a collection and return whatever `f` returns.
///
/// `f` runs exactly once, against the freshest copy the backend can provide.
pub async fn update_collection<T, R, F>(
    store: &dyn BaseStore,
    key: &str,
    f: F,
) -> Result<R, StoreError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce(&mut Vec<T>) -> R + Send,
    R: Send,
{
    let mut f = Some(f);
    let mut output = None;

    store
        .modify(key, &mut |current| {
            let mut items: Vec<T> = decode(key, current)?;
            let f = f
                .take()
                .ok_or_else(|| StoreError::Backend(format!("update of {key} re-entered")))?;
            output = Some(f(&mut items));
            serde_json::to_value(&items).map_err(|e| StoreError::serialization(key, e))
        })
        .await?;

    output.ok_or_else(|| StoreError::Backend(format!("update of {key} did not run")))
}
