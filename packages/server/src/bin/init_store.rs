//! Seed the store with empty collections.
//!
//! Usage:
//!   cargo run --bin init_store            # create missing keys only
//!   cargo run --bin init_store -- --force # reset every key to []

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use server_core::config::StoreConfig;
use server_core::kernel::store::{open_store, COLLECTION_KEYS};

#[derive(Parser, Debug)]
#[command(name = "init_store", about = "Seed the matcher store with empty collections")]
struct Args {
    /// Overwrite keys that already hold data
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let config = StoreConfig::from_env().context("Failed to load store configuration")?;
    let store = open_store(&config).await?;

    for key in COLLECTION_KEYS {
        let existing = store
            .get(key)
            .await
            .with_context(|| format!("Failed to read {key}"))?;

        let present = existing.is_some_and(|value| !value.is_null());
        if present && !args.force {
            tracing::info!(key, "Already initialized, leaving as is");
            continue;
        }

        store
            .set(key, json!([]))
            .await
            .with_context(|| format!("Failed to initialize {key}"))?;
        tracing::info!(key, forced = args.force, "Initialized to []");
    }

    tracing::info!(backend = store.backend(), "Store initialization complete");
    Ok(())
}
