//! Stowage cache sweeper
//!
//! Removes cache entries that were never committed: uploads replaced before
//! save, failed saves, or deferred commits whose job was lost.

use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stowage_core::CacheStore;
use stowage_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stowage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    let cache = CacheStore::from_config(&config.cache);
    info!(
        root = %cache.root().display(),
        max_age_secs = config.cache.max_age_secs,
        "Sweeping cache"
    );

    let removed = cache
        .clean(Duration::from_secs(config.cache.max_age_secs))
        .await?;
    info!(removed, "Cache sweep complete");

    Ok(())
}
