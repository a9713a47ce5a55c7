//! Book catalog: a SQLite record store served over HTTP, the list query
//! pipeline both sides share, and a terminal UI that keeps its own copy of the
//! collection in local storage.
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod logging;
pub mod models;
pub mod query;
pub mod storage;
pub mod ui;

/// Record store entry points used by `catalog-server` and the tests.
pub use db::{BookStore, DatabaseLocation, MemoryStore, SqliteStore};

pub use error::CatalogError;
pub use models::{Book, BookFields, BookId};
pub use query::{BookQuery, SearchFields};

/// The interactive application entry point and state container.
pub use ui::{run_app, App, Library};
