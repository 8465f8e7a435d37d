//! FitQuest - Fitness Gamification Engine
//!
//! Runs the challenge lifecycle sweeper against the configured database and
//! logs the notifications it produces.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use fitquest::notifications::ChannelSink;
use fitquest::storage::config::load_config;
use fitquest::{Database, GamificationEngine};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting FitQuest v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config().context("loading configuration")?;
    let db_path = config.database_path();
    let db = Arc::new(
        Database::open(&db_path).with_context(|| format!("opening {}", db_path.display()))?,
    );
    tracing::info!("Using database at {}", db_path.display());

    let (sink, notifications) = ChannelSink::new();
    let delivery = std::thread::spawn(move || {
        for request in notifications {
            match request.payload() {
                Ok(payload) => tracing::info!(
                    user_id = %request.user_id,
                    kind = request.kind.as_str(),
                    "Notification: {}",
                    payload
                ),
                Err(e) => tracing::warn!("Unrenderable notification: {}", e),
            }
        }
    });

    let period = Duration::from_secs(config.scheduler.sweep_interval_secs.max(1));
    let engine = Arc::new(GamificationEngine::new(db, config, Arc::new(sink)));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    runtime.block_on(fitquest::scheduler::run_sweeper(engine, period, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    }));

    // Dropping the runtime releases the last engine handle and closes the channel.
    drop(runtime);
    if delivery.join().is_err() {
        tracing::warn!("Notification logger panicked");
    }

    tracing::info!("FitQuest stopped");
    Ok(())
}
