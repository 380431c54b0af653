// Main entry point for the coffee chat matcher

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use server_core::domains::matching::CycleRunner;
use server_core::kernel::store::open_store;
use server_core::kernel::{start_scheduler, BaseNotifier, ServerDeps, SlackAdapter};
use server_core::server::{build_app, AppState};
use server_core::Config;
use slack::{SlackOptions, SlackService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Scopes the bot token needs for group DMs, posting and reading replies
const REQUIRED_SCOPES: [&str; 4] = ["mpim:write", "chat:write", "im:write", "users:read"];

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting coffee chat matcher");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        roster = config.matching.roster.len(),
        "Configuration loaded"
    );

    let store = open_store(&config.store)
        .await
        .context("Failed to open store")?;
    tracing::info!(backend = store.backend(), "Store ready");

    let slack = SlackService::new(SlackOptions::new(config.slack_bot_token.clone()))
        .context("Failed to create Slack client")?;
    let notifier = SlackAdapter::new(Arc::new(slack));
    let slack_connected = verify_slack(&notifier).await?;

    let deps = ServerDeps::new(store, Arc::new(notifier), config.matching.clone());
    let runner = CycleRunner::new(deps);

    let _scheduler = start_scheduler(
        runner.clone(),
        &config.pairing_cron,
        &config.follow_up_cron,
    )
    .await
    .context("Failed to start scheduler")?;

    let app = build_app(AppState::new(runner, slack_connected));

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Check the bot token. A missing scope is fatal; an unreachable Slack is only
/// reported, since every cycle retries delivery anyway.
async fn verify_slack(notifier: &SlackAdapter) -> Result<bool> {
    let identity = match notifier.verify_connection().await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(error = %e, "Could not verify Slack connection");
            return Ok(false);
        }
    };

    let missing: Vec<&str> = REQUIRED_SCOPES
        .iter()
        .copied()
        .filter(|scope| !identity.scopes.iter().any(|s| s == scope))
        .collect();
    if !missing.is_empty() {
        bail!("Slack bot token is missing required scopes: {}", missing.join(", "));
    }

    tracing::info!(
        user = identity.user.as_deref().unwrap_or("unknown"),
        team = identity.team.as_deref().unwrap_or("unknown"),
        "Slack connection verified"
    );
    Ok(true)
}
