//! Server configuration read from the process environment at startup.

use std::env;

use anyhow::{Context, Result};

use crate::db::DatabaseLocation;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;

/// Everything `catalog-server` needs to come up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind to (`HOST`, default `0.0.0.0`).
    pub host: String,
    /// Listening port (`PORT`, default 5000).
    pub port: u16,
    /// Record store location (`DATABASE_URL`, default
    /// `~/.book-catalog/catalog.sqlite`).
    pub database: DatabaseLocation,
}

impl ServerConfig {
    /// Read `HOST`, `PORT` and `DATABASE_URL` from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable lookup. Unset and empty
    /// variables both fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got {raw:?}"))?,
            None => DEFAULT_PORT,
        };

        let database = match var("DATABASE_URL") {
            Some(raw) => DatabaseLocation::parse(&raw).context("invalid DATABASE_URL")?,
            None => DatabaseLocation::default_file()?,
        };

        Ok(Self {
            host,
            port,
            database,
        })
    }

    /// Get the socket address string.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
