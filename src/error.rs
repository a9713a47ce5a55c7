//! Error taxonomy shared by the record store, the HTTP facade, and the local
//! library state. Application edges (binaries, the terminal UI) wrap these in
//! `anyhow` the same way they wrap any other failure.

use thiserror::Error;

use crate::models::BookId;

/// Everything that can go wrong while reading or changing the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Input rejected before it reached the store, e.g. a blank title.
    #[error("{0}")]
    Validation(String),

    #[error("Book {0} not found")]
    NotFound(BookId),

    /// A path segment or stored key that cannot be read as a book id.
    #[error("Invalid book id: {0}")]
    InvalidId(String),

    /// The SQLite layer failed. `context` names the query that was running.
    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// A blocking store task panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(String),
}

impl CatalogError {
    pub fn validation(message: impl Into<String>) -> Self {
        CatalogError::Validation(message.into())
    }

    /// Build a `map_err` adapter that tags a rusqlite failure with the query
    /// being executed.
    pub(crate) fn store(context: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| CatalogError::Store { context, source }
    }
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;
