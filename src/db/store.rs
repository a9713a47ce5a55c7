use std::collections::BTreeSet;

use parking_lot::Mutex;
use rusqlite::Connection;
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::models::{creation_timestamp, Book, BookFields, BookId};
use crate::query::{category_options, BookQuery, SearchFields, ALL_CATEGORIES};

use super::books::{delete_book, fetch_books, fetch_categories, insert_book, update_book};
use super::connection::{open_database, DatabaseLocation};

/// The record store contract the HTTP facade is built against. Handlers only
/// ever see `Arc<dyn BookStore>`, so tests can swap in [`MemoryStore`].
pub trait BookStore: Send + Sync {
    /// Persist a new book. Fails with `Validation` when the title is blank.
    fn create(&self, fields: BookFields) -> Result<Book>;

    /// Books matching `query`, in pipeline order.
    fn list(&self, query: &BookQuery) -> Result<Vec<Book>>;

    /// Merge `fields` into the book with `id`. Fails with `NotFound` for an
    /// unknown id.
    fn update(&self, id: BookId, fields: BookFields) -> Result<Book>;

    /// Remove the book with `id`, reporting whether it existed.
    fn delete(&self, id: BookId) -> Result<bool>;

    /// `"All"` followed by every category in use.
    fn distinct_categories(&self) -> Result<Vec<String>>;
}

/// Durable store on top of a single SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(location: &DatabaseLocation) -> anyhow::Result<Self> {
        Ok(Self::from_connection(open_database(location)?))
    }

    /// Wrap an already prepared connection. The caller is responsible for
    /// having gone through `open_database` so the schema and SQL helpers exist.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl BookStore for SqliteStore {
    fn create(&self, fields: BookFields) -> Result<Book> {
        let new_book = fields.into_new_book()?;
        let book = insert_book(&self.conn.lock(), new_book, creation_timestamp())?;
        debug!(id = book.id, title = %book.title, "created book");
        Ok(book)
    }

    fn list(&self, query: &BookQuery) -> Result<Vec<Book>> {
        fetch_books(&self.conn.lock(), query)
    }

    fn update(&self, id: BookId, fields: BookFields) -> Result<Book> {
        let book = update_book(&self.conn.lock(), id, fields)?;
        debug!(id, "updated book");
        Ok(book)
    }

    fn delete(&self, id: BookId) -> Result<bool> {
        let removed = delete_book(&self.conn.lock(), id)?;
        debug!(id, removed, "deleted book");
        Ok(removed)
    }

    fn distinct_categories(&self) -> Result<Vec<String>> {
        fetch_categories(&self.conn.lock())
    }
}

/// Volatile store that keeps records in insertion order and answers queries
/// with the in-memory pipeline.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    books: Vec<Book>,
    last_id: BookId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookStore for MemoryStore {
    fn create(&self, fields: BookFields) -> Result<Book> {
        let new_book = fields.into_new_book()?;
        let mut state = self.state.lock();
        state.last_id += 1;
        let book = new_book.into_book(state.last_id, creation_timestamp());
        state.books.push(book.clone());
        Ok(book)
    }

    fn list(&self, query: &BookQuery) -> Result<Vec<Book>> {
        let state = self.state.lock();
        Ok(query.apply(&state.books, SearchFields::TitleAuthorIsbn))
    }

    fn update(&self, id: BookId, fields: BookFields) -> Result<Book> {
        let mut state = self.state.lock();
        let book = state
            .books
            .iter_mut()
            .find(|book| book.id == id)
            .ok_or(CatalogError::NotFound(id))?;
        let mut updated = book.clone();
        fields.apply_to(&mut updated)?;
        *book = updated.clone();
        Ok(updated)
    }

    fn delete(&self, id: BookId) -> Result<bool> {
        let mut state = self.state.lock();
        let before = state.books.len();
        state.books.retain(|book| book.id != id);
        Ok(state.books.len() != before)
    }

    fn distinct_categories(&self) -> Result<Vec<String>> {
        let state = self.state.lock();
        let in_use: BTreeSet<&str> = state
            .books
            .iter()
            .map(|book| book.category.as_str())
            .filter(|category| *category != ALL_CATEGORIES)
            .collect();
        Ok(category_options(in_use))
    }
}
