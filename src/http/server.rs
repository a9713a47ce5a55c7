//! HTTP server wiring the book routes to a listener.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::routes::book_routes;
use crate::config::ServerConfig;
use crate::db::BookStore;

/// Build the full application router: book routes under `/api`, request
/// tracing, and permissive CORS so any browser origin may call the API.
pub fn build_router(store: Arc<dyn BookStore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", book_routes(store))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// HTTP server for the book catalog.
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: ServerConfig, store: Arc<dyn BookStore>) -> Self {
        Self {
            config,
            router: build_router(store),
        }
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Bind and serve until Ctrl-C or, on unix, SIGTERM.
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .with_context(|| format!("invalid listen address {}", self.config.socket_addr()))?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        info!(%addr, "book catalog API listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;

        info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseLocation, MemoryStore};

    fn config(port: u16) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port,
            database: DatabaseLocation::Memory,
        }
    }

    #[test]
    fn server_reports_its_address() {
        let server = HttpServer::new(config(8080), Arc::new(MemoryStore::new()));
        assert_eq!(server.socket_addr(), "127.0.0.1:8080");
    }

    #[tokio::test]
    async fn start_rejects_an_unparseable_address() {
        let mut config = config(0);
        config.host = "not a host".to_string();
        let err = HttpServer::new(config, Arc::new(MemoryStore::new()))
            .start()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid listen address"));
    }
}
