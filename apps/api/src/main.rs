mod config;
mod errors;
mod models;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StorageBackend};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{FileStorage, MemoryStorage, ResumeStorage, ResumeStore, StoreOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize storage
    let storage: Arc<dyn ResumeStorage> = match config.storage_backend {
        StorageBackend::File => {
            let file = FileStorage::new(&config.data_dir, &config.storage_key);
            info!("File storage at {}", file.path().display());
            Arc::new(file)
        }
        StorageBackend::Memory => {
            warn!("Memory storage selected; resumes will not survive a restart");
            Arc::new(MemoryStorage::new(&config.storage_key))
        }
    };

    // Load persisted state
    let store = ResumeStore::open(
        storage,
        StoreOptions {
            persist_draft: config.persist_draft,
        },
    )?;
    info!("Loaded {} saved resume(s)", store.resumes().len());

    // Build app state
    let state = AppState::new(store, config.clone());
    let store = state.store.clone();

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Retry any write that failed while serving
    let mut store = store.lock().await;
    if store.is_dirty() {
        store.flush()?;
    }
    info!("Shut down cleanly");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
