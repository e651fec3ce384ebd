use anyhow::Context;
use std::sync::Arc;

use teamcamp_api::state::AppState;
use teamcamp_api::storage::ObjectStorage;
use teamcamp_api::store::PgStore;
use teamcamp_api::{config, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SUPABASE_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    if let Err(missing) = config.validate() {
        anyhow::bail!(missing);
    }
    tracing::info!("Starting TeamCamp API in {:?} mode", config.environment);

    let store = Arc::new(
        PgStore::connect()
            .await
            .context("failed to connect to database")?,
    );

    let storage = ObjectStorage::from_config(&config.storage)
        .context("invalid object storage configuration")?;
    if storage.is_none() {
        tracing::warn!("object storage not configured; file blobs will not be removed on delete");
    }

    let state = AppState::new(store.clone(), storage);
    let app = handlers::app(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(config.server.port);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    println!("🚀 TeamCamp API server listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    store.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
