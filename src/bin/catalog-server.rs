//! HTTP server for the book catalog. Configured through `HOST`, `PORT`,
//! `DATABASE_URL` and `RUST_LOG`.
use std::sync::Arc;

use book_catalog::config::ServerConfig;
use book_catalog::http::HttpServer;
use book_catalog::logging::init_tracing;
use book_catalog::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::from_env()?;
    let store = SqliteStore::open(&config.database)?;
    tracing::info!(database = ?config.database, "record store ready");

    HttpServer::new(config, Arc::new(store)).start().await
}
