#![recursion_limit = "256"]

pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use config::{AppConfig, CatalogConfig, StoreBackend};
pub use error::ShopError;
pub use logic::{CartOperations, CatalogOperations};
pub use model::*;
pub use store::{MemoryStore, PostgresStore, Store};

use axum::Router;
use log::{info, warn};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::api::handlers::AppState;

/// Build the HTTP application over any store
pub fn app<S: Store + 'static>(store: Arc<S>, catalog: CatalogConfig) -> Router {
    api::routes::create_router::<S>().with_state(AppState::new(store, catalog))
}

/// Connect the configured store and serve until the listener fails
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    match config.store {
        StoreBackend::Postgres => {
            info!("Connecting to PostgreSQL...");
            let database_url = config.database_url()?;
            let store = PostgresStore::new(&database_url, config.max_connections()).await?;

            info!("Creating database schema if missing...");
            store.migrate().await?;

            serve(Arc::new(store), &config).await
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; all data is lost on shutdown");
            serve(Arc::new(MemoryStore::new()), &config).await
        }
    }
}

async fn serve<S: Store + 'static>(store: Arc<S>, config: &AppConfig) -> anyhow::Result<()> {
    // Load seed data for demonstration (optional)
    if std::env::var("LOAD_SEED_DATA").unwrap_or_default() == "true" {
        info!("Loading seed data...");
        let loaded = seed::load_seed_data(&*store).await?;
        info!("Seed data loaded: {} new products", loaded);
    }

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    info!("Storefront server running on http://{}", bind_address);
    info!(
        "API documentation available at http://{}/docs",
        bind_address
    );

    axum::serve(listener, app(store, config.catalog)).await?;

    Ok(())
}
