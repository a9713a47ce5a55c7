//! Terminal front-end for the local library, split into the state container
//! (`library`), form state, rendering helpers, the key-driven `App`, and the
//! crossterm event loop.

mod app;
mod forms;
mod helpers;
mod library;
mod terminal;
mod theme;

pub use app::App;
pub use library::{BookDraft, Library, SortOption, Submission, BOOKS_KEY, THEME_KEY};
pub use terminal::run_app;
pub use theme::Theme;
