//! Persistence module split across logical submodules: connection bootstrap,
//! the SQL for each operation, and the `BookStore` implementations built on
//! top of them.

mod books;
mod connection;
mod store;

pub use books::{
    delete_book, fetch_book, fetch_books, fetch_categories, insert_book, update_book,
};
pub use connection::{data_dir, ensure_schema, open_database, DatabaseLocation, DATA_DIR_NAME};
pub use store::{BookStore, MemoryStore, SqliteStore};
