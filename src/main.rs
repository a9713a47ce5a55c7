//! Terminal UI entry point: open local storage, restore the library, and run
//! the event loop until the user quits.
use std::env;
use std::path::PathBuf;

use book_catalog::db::data_dir;
use book_catalog::logging::init_file_tracing;
use book_catalog::storage::FileStorage;
use book_catalog::{run_app, App, Library};

/// Overrides where the UI keeps its storage files and log.
const HOME_ENV: &str = "BOOK_CATALOG_HOME";

fn storage_dir() -> anyhow::Result<PathBuf> {
    match env::var_os(HOME_ENV) {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => Ok(data_dir()?.join("local-storage")),
    }
}

fn main() -> anyhow::Result<()> {
    let dir = storage_dir()?;
    init_file_tracing(&dir.join("ui.log"))?;
    tracing::info!(dir = %dir.display(), "starting book catalog UI");

    let library = Library::load(Box::new(FileStorage::new(&dir)))?;
    let mut app = App::new(library);
    run_app(&mut app)
}
