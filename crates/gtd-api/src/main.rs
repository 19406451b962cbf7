//! gtd-api: REST API server for the gtd task organizer
//!
//! Serves items, projects, review lists and full-data export/import over
//! HTTP for the web client.

mod error;
mod handlers;
mod routes;

use anyhow::Context;
use error::ApiError;
use gtd_core::{Config, Error, Store, seed};
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared application state
pub struct AppState {
    store: RwLock<Store>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Store, config: Config) -> Self {
        Self {
            store: RwLock::new(store),
            config,
        }
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, Store>, ApiError> {
        self.store
            .read()
            .map_err(|e| ApiError::internal(format!("store lock poisoned: {e}")))
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, Store>, ApiError> {
        self.store
            .write()
            .map_err(|e| ApiError::internal(format!("store lock poisoned: {e}")))
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Open the store named by `GTD_ROOT`, or the one above the working
/// directory, creating one in the working directory when none exists
fn open_store() -> anyhow::Result<Store> {
    if let Ok(root) = std::env::var("GTD_ROOT") {
        return Store::open_or_init(PathBuf::from(root)).context("Failed to open store");
    }
    match Store::open() {
        Err(Error::NotInitialized) => {
            let cwd = std::env::current_dir()?;
            Store::open_or_init(cwd).context("Failed to initialize store")
        }
        other => other.context("Failed to open store"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut store = open_store()?;
    let config = store.config().context("Failed to load config")?;

    if config.seed_on_empty {
        seed::seed_if_empty(&mut store)?;
    }

    // Environment overrides config
    let host = std::env::var("GTD_API_HOST").unwrap_or_else(|_| config.server.host.clone());
    let port: u16 = std::env::var("GTD_API_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(config.server.port);

    let state = Arc::new(AppState::new(store, config));
    let app = routes::router(state);

    let addr = format!("{host}:{port}");
    tracing::info!("Starting gtd-api on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
