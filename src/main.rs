use env_logger::Builder;
use log::{info, LevelFilter};
use storefront_db::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Info by default, sqlx statement logging kept quiet; RUST_LOG overrides both
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("sqlx", LevelFilter::Warn)
        .parse_default_env()
        .init();

    info!("Storefront: catalog and cart server");

    let config = AppConfig::load()?;
    info!(
        "Configuration loaded: server={}:{}, store={:?}",
        config.server.host, config.server.port, config.store
    );

    storefront_db::run_server(config).await
}
