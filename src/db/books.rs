use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::error::{CatalogError, Result};
use crate::models::{Book, BookFields, BookId, NewBook};
use crate::query::{category_options, BookQuery, SortDirection, SortField, SortSpec, ALL_CATEGORIES};

const BOOK_COLUMNS: &str = "id, title, author, isbn, category, year, created_at";
/// Columns the server-side search looks at.
const SEARCH_COLUMNS: &[&str] = &["title", "author", "isbn"];

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    let created_ms: i64 = row.get(6)?;
    let created_at = DateTime::<Utc>::from_timestamp_millis(created_ms)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(6, created_ms))?;
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        isbn: row.get(3)?,
        category: row.get(4)?,
        year: row.get(5)?,
        created_at,
    })
}

/// Run the query pipeline inside SQLite: category and search become `WHERE`
/// clauses and the sort becomes `ORDER BY`, with `id` as the tie-break so
/// equal keys keep insertion order.
pub fn fetch_books(conn: &Connection, query: &BookQuery) -> Result<Vec<Book>> {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(category) = query.category_filter() {
        clauses.push("category = ?".to_string());
        values.push(Value::Text(category.to_string()));
    }

    if let Some(needle) = query.search_needle() {
        let matches: Vec<String> = SEARCH_COLUMNS
            .iter()
            .map(|column| format!("instr(fold_case({column}), ?) > 0"))
            .collect();
        clauses.push(format!("({})", matches.join(" OR ")));
        values.extend(SEARCH_COLUMNS.iter().map(|_| Value::Text(needle.clone())));
    }

    let mut sql = format!("SELECT {BOOK_COLUMNS} FROM books");
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push(' ');
    sql.push_str(&order_clause(query.sort_spec()));

    let mut stmt = conn
        .prepare(&sql)
        .map_err(CatalogError::store("failed to prepare book query"))?;

    let books = stmt
        .query_map(params_from_iter(values), book_from_row)
        .map_err(CatalogError::store("failed to load books"))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(CatalogError::store("failed to collect books"))?;

    Ok(books)
}

fn order_clause(spec: SortSpec) -> String {
    let key = match spec.field {
        SortField::Title => "fold_case(title)",
        SortField::Author => "fold_case(author)",
        SortField::Year => "year",
        SortField::CreatedAt => "created_at",
        SortField::Unrecognized => return "ORDER BY id ASC".to_string(),
    };
    let direction = match spec.direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    format!("ORDER BY {key} {direction}, id ASC")
}

/// Look up a single book by id.
pub fn fetch_book(conn: &Connection, id: BookId) -> Result<Option<Book>> {
    conn.query_row(
        &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"),
        params![id],
        book_from_row,
    )
    .optional()
    .map_err(CatalogError::store("failed to load book"))
}

/// Insert a validated book and echo the hydrated record, including the row id
/// SQLite assigned.
pub fn insert_book(conn: &Connection, book: NewBook, created_at: DateTime<Utc>) -> Result<Book> {
    conn.execute(
        "INSERT INTO books (title, author, isbn, category, year, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            book.title,
            book.author,
            book.isbn,
            book.category,
            book.year,
            created_at.timestamp_millis()
        ],
    )
    .map_err(CatalogError::store("failed to insert book"))?;

    let id = conn.last_insert_rowid();
    Ok(book.into_book(id, created_at))
}

/// Merge `fields` into the stored record and write it back. Unknown ids and
/// blank titles are rejected before anything is written.
pub fn update_book(conn: &Connection, id: BookId, fields: BookFields) -> Result<Book> {
    let mut book = fetch_book(conn, id)?.ok_or(CatalogError::NotFound(id))?;
    fields.apply_to(&mut book)?;

    let updated = conn
        .execute(
            "UPDATE books
             SET title = ?1, author = ?2, isbn = ?3, category = ?4, year = ?5
             WHERE id = ?6",
            params![book.title, book.author, book.isbn, book.category, book.year, id],
        )
        .map_err(CatalogError::store("failed to update book"))?;

    if updated == 0 {
        Err(CatalogError::NotFound(id))
    } else {
        Ok(book)
    }
}

/// Remove a book row. Returns whether a row was actually deleted; a missing id
/// is not an error.
pub fn delete_book(conn: &Connection, id: BookId) -> Result<bool> {
    let deleted = conn
        .execute("DELETE FROM books WHERE id = ?1", params![id])
        .map_err(CatalogError::store("failed to delete book"))?;
    Ok(deleted > 0)
}

/// Every category in use, sorted, behind the leading "All" sentinel.
pub fn fetch_categories(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT DISTINCT category FROM books WHERE category <> ?1 ORDER BY category")
        .map_err(CatalogError::store("failed to prepare category query"))?;

    let categories = stmt
        .query_map(params![ALL_CATEGORIES], |row| row.get::<_, String>(0))
        .map_err(CatalogError::store("failed to load categories"))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(CatalogError::store("failed to collect categories"))?;

    Ok(category_options(categories))
}
