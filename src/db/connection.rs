use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

use crate::query::fold_case;

/// Folder name used beneath the user's home directory for application data.
pub const DATA_DIR_NAME: &str = ".book-catalog";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "catalog.sqlite";

/// Where the record store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    File(PathBuf),
    /// A private in-memory database, gone when the process exits.
    Memory,
}

impl DatabaseLocation {
    /// Parse a connection string: `:memory:`, `sqlite::memory:`,
    /// `sqlite://<path>`, or a bare file path.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(anyhow!("database location is empty"));
        }
        if raw == ":memory:" || raw == "sqlite::memory:" {
            return Ok(DatabaseLocation::Memory);
        }
        let path = raw.strip_prefix("sqlite://").unwrap_or(raw);
        Ok(DatabaseLocation::File(PathBuf::from(path)))
    }

    /// `~/.book-catalog/catalog.sqlite`.
    pub fn default_file() -> Result<Self> {
        Ok(DatabaseLocation::File(data_dir()?.join(DB_FILE_NAME)))
    }
}

/// Resolve the application data directory inside the user's home.
pub fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

/// Open (creating when needed) the database, register the SQL helpers, and
/// run the lazy migration.
pub fn open_database(location: &DatabaseLocation) -> Result<Connection> {
    let conn = match location {
        DatabaseLocation::File(path) => {
            create_parent_dir(path)?;
            Connection::open(path)
                .with_context(|| format!("failed to open SQLite database {}", path.display()))?
        }
        DatabaseLocation::Memory => {
            Connection::open_in_memory().context("failed to open in-memory SQLite database")?
        }
    };

    register_functions(&conn)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }
    }
    Ok(())
}

/// Create the `books` table if it does not exist yet.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            author TEXT NOT NULL DEFAULT '',
            isbn TEXT NOT NULL DEFAULT '',
            category TEXT NOT NULL DEFAULT 'General',
            year INTEGER,
            created_at INTEGER NOT NULL
        )",
        [],
    )
    .context("failed to create books table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS books_category ON books (category)",
        [],
    )
    .context("failed to create category index")?;

    Ok(())
}

/// Install `fold_case(text)` so SQL comparisons fold case exactly like the
/// in-memory pipeline does. SQLite's own `lower()` only handles ASCII.
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|text| fold_case(&text)))
        },
    )
    .context("failed to register fold_case")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_connection_strings() {
        assert_eq!(
            DatabaseLocation::parse(":memory:").unwrap(),
            DatabaseLocation::Memory
        );
        assert_eq!(
            DatabaseLocation::parse("sqlite:///tmp/books.db").unwrap(),
            DatabaseLocation::File(PathBuf::from("/tmp/books.db"))
        );
        assert_eq!(
            DatabaseLocation::parse("data/books.db").unwrap(),
            DatabaseLocation::File(PathBuf::from("data/books.db"))
        );
        assert!(DatabaseLocation::parse("  ").is_err());
    }

    #[test]
    fn fold_case_is_available_in_sql() {
        let conn = open_database(&DatabaseLocation::Memory).unwrap();
        let folded: String = conn
            .query_row("SELECT fold_case('ÉCOLE Go')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(folded, "école go");
    }

    #[test]
    fn file_databases_create_their_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("catalog.sqlite");
        open_database(&DatabaseLocation::File(path.clone())).unwrap();
        assert!(path.exists());
        // A second open runs the migration against an existing table.
        open_database(&DatabaseLocation::File(path)).unwrap();
    }
}
