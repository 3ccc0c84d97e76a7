mod config;
mod domain;
mod paths;
mod progress_api;
mod remote_client;
mod storage;
mod sync;

use std::{path::Path, sync::Arc};

use anyhow::Context;
use config::Config;
use domain::ProgressTracker;
use poem::{Server, listener::TcpListener};
use progress_api::ProgressApi;
use remote_client::RemoteClient;
use storage::{ProgressStore, SeaOrmProgressStore, WriteThrough};
use sync::SyncWorker;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt::SubscriberBuilder, prelude::*};

type ProgressSyncResult<T> = anyhow::Result<T>;

#[tokio::main]
async fn main() -> ProgressSyncResult<()> {
    // Initialize tracing (logs). Respect RUST_LOG if set, default to info for our crate and warn for deps.
    let default_filter = format!(
        "{}=info,poem=info,reqwest=warn,sea_orm=warn,sqlx=warn",
        env!("CARGO_PKG_NAME")
    );
    let env_filter = std::env::var("RUST_LOG").unwrap_or(default_filter);
    SubscriberBuilder::default()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .with_level(true)
        .pretty()
        .finish()
        .with(ErrorLayer::default())
        .init();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting comic progress sync"
    );
    // Load environment variables from .env files
    if Path::new(".env.local").exists() {
        dotenvy::from_filename(".env.local")?;
    } else if Path::new(".env").exists() {
        dotenvy::from_filename(".env")?;
    };
    let config = Config::load()?;
    config.validate().map_err(anyhow::Error::msg)?;
    tracing::info!(app_env = ?config.app_env, data_dir = %config.data_dir.display(), "loaded configuration");

    paths::ensure_dir(&config.data_dir)?;
    let store: Arc<dyn ProgressStore> =
        Arc::new(SeaOrmProgressStore::connect(&config.db_connection_string).await?);

    let tracker = Arc::new(ProgressTracker::new());
    hydrate(&tracker, store.as_ref()).await?;
    let writer = Arc::new(WriteThrough::new(tracker, store));

    match &config.remote_base_url {
        Some(base_url) => {
            let client = RemoteClient::new(base_url)?.with_api_key(&config.remote_api_key);
            let has_api_key = !config.remote_api_key.is_empty();
            tracing::info!(remote_base = %base_url, has_api_key, "configured remote sync");
            let worker = SyncWorker::new(writer.clone(), client, config.sync_interval);
            tokio::spawn(worker.run());
        }
        None => tracing::info!("no REMOTE_BASE_URL configured, remote sync disabled"),
    }

    run_poem(writer, Arc::new(config)).await?;
    Ok(())
}

/// Load the persisted replica into an empty tracker.
async fn hydrate(tracker: &ProgressTracker, store: &dyn ProgressStore) -> ProgressSyncResult<()> {
    let records = store
        .load_all()
        .await
        .with_context(|| "Failed to load persisted progress")?;
    let total = records.len();
    let mut skipped = 0usize;
    for record in records {
        if let Err(e) = tracker.reconcile(record) {
            skipped += 1;
            tracing::warn!(error = %e, "skipping invalid persisted progress row");
        }
    }
    tracing::info!(loaded = total - skipped, skipped, "hydrated progress tracker");
    Ok(())
}

pub async fn run_poem(writer: Arc<WriteThrough>, config: Arc<Config>) -> ProgressSyncResult<()> {
    let bind_addr = config.bind_addr.as_str();
    let server_url = format!("http://{}", bind_addr.replace("0.0.0.0", "localhost"));
    let route = progress_api::app(ProgressApi { writer }, &server_url);

    tracing::info!(%bind_addr, "starting HTTP server");
    Server::new(TcpListener::bind(bind_addr)).run(route).await?;
    Ok(())
}
