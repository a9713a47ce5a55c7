//! The terminal UI's local collection: the books, the current search, filter
//! and sort, and the theme. Every change to the books or the theme is written
//! straight back to [`Persistence`], so the next launch starts where this one
//! stopped.

use anyhow::{anyhow, Context, Result};
use tracing::{debug, warn};

use crate::error::CatalogError;
use crate::models::{creation_timestamp, normalize_title, Book, BookId, SUGGESTED_CATEGORIES};
use crate::query::{category_options, BookQuery, SearchFields, ALL_CATEGORIES};
use crate::storage::Persistence;

use super::theme::Theme;

/// Storage key holding the JSON array of books.
pub const BOOKS_KEY: &str = "library_books_v2";
/// Storage key holding `"dark"` or `"light"`.
pub const THEME_KEY: &str = "library_theme";

/// Orderings offered by the sort control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    #[default]
    TitleAsc,
    TitleDesc,
    AuthorAsc,
    AuthorDesc,
    YearAsc,
    YearDesc,
}

impl SortOption {
    pub const ALL: [SortOption; 6] = [
        SortOption::TitleAsc,
        SortOption::TitleDesc,
        SortOption::AuthorAsc,
        SortOption::AuthorDesc,
        SortOption::YearAsc,
        SortOption::YearDesc,
    ];

    /// Sort key understood by the query pipeline.
    pub fn key(self) -> &'static str {
        match self {
            SortOption::TitleAsc => "title_asc",
            SortOption::TitleDesc => "title_desc",
            SortOption::AuthorAsc => "author_asc",
            SortOption::AuthorDesc => "author_desc",
            SortOption::YearAsc => "year_asc",
            SortOption::YearDesc => "year_desc",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOption::TitleAsc => "Title (A-Z)",
            SortOption::TitleDesc => "Title (Z-A)",
            SortOption::AuthorAsc => "Author (A-Z)",
            SortOption::AuthorDesc => "Author (Z-A)",
            SortOption::YearAsc => "Year (Old-New)",
            SortOption::YearDesc => "Year (New-Old)",
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|option| *option == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

/// Values typed into the book form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub category: String,
    pub year: Option<i32>,
}

/// What the form asks the library to do on save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    New(BookDraft),
    Edit(BookId, BookDraft),
}

/// Local book collection plus the view settings applied to it.
pub struct Library {
    storage: Box<dyn Persistence>,
    books: Vec<Book>,
    search: String,
    category_filter: String,
    sort: SortOption,
    theme: Theme,
}

impl Library {
    /// Restore books and theme from `storage`. Missing keys start empty and
    /// dark; a books value that is not valid JSON is an error.
    pub fn load(storage: Box<dyn Persistence>) -> Result<Self> {
        let books = match storage.load(BOOKS_KEY)? {
            Some(raw) if !raw.trim().is_empty() => {
                serde_json::from_str(&raw).context("failed to parse saved books")?
            }
            _ => Vec::new(),
        };
        let theme = Theme::from_stored(storage.load(THEME_KEY)?.as_deref());
        debug!(count = books.len(), theme = theme.as_str(), "library loaded");

        Ok(Self {
            storage,
            books,
            search: String::new(),
            category_filter: ALL_CATEGORIES.to_string(),
            sort: SortOption::default(),
            theme,
        })
    }

    /// Every book, in collection order.
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// Books after the category filter, the title/author search and the sort.
    pub fn visible_books(&self) -> Vec<Book> {
        BookQuery::new()
            .with_search(self.search.clone())
            .with_category(self.category_filter.clone())
            .with_sort(self.sort.key())
            .apply(&self.books, SearchFields::TitleAuthor)
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn category_filter(&self) -> &str {
        &self.category_filter
    }

    pub fn set_category_filter(&mut self, category: impl Into<String>) {
        self.category_filter = category.into();
    }

    /// `"All"` followed by the suggested categories.
    pub fn category_filter_options(&self) -> Vec<String> {
        category_options(SUGGESTED_CATEGORIES.iter().copied())
    }

    /// Step the category filter through its options, wrapping at either end.
    pub fn cycle_category_filter(&mut self, offset: isize) {
        let options = self.category_filter_options();
        let len = options.len() as isize;
        let current = options
            .iter()
            .position(|option| *option == self.category_filter)
            .map(|index| index as isize)
            .unwrap_or(0);
        let next = (current + offset).rem_euclid(len) as usize;
        self.category_filter = options[next].clone();
    }

    pub fn sort(&self) -> SortOption {
        self.sort
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.sort = sort;
    }

    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Switch between dark and light and persist the choice.
    pub fn toggle_theme(&mut self) -> Result<Theme> {
        let theme = self.theme.toggled();
        self.storage
            .save(THEME_KEY, theme.as_str())
            .context("failed to save theme")?;
        self.theme = theme;
        Ok(theme)
    }

    /// Apply a form submission and return the stored book.
    ///
    /// A blank title is rejected before anything changes. New books go to the
    /// front of the collection; edits keep the id, creation time and isbn.
    /// The collection only changes once the new state has been saved.
    pub fn submit(&mut self, submission: Submission) -> Result<Book> {
        let mut books = self.books.clone();
        let book = match submission {
            Submission::New(draft) => {
                let title = normalize_title(&draft.title)?;
                let book = Book {
                    id: self.next_id()?,
                    title,
                    author: draft.author.trim().to_string(),
                    isbn: String::new(),
                    category: draft.category,
                    year: draft.year,
                    created_at: creation_timestamp(),
                };
                books.insert(0, book.clone());
                book
            }
            Submission::Edit(id, draft) => {
                let title = normalize_title(&draft.title)?;
                let book = books
                    .iter_mut()
                    .find(|book| book.id == id)
                    .ok_or(CatalogError::NotFound(id))?;
                book.title = title;
                book.author = draft.author.trim().to_string();
                book.category = draft.category;
                book.year = draft.year;
                book.clone()
            }
        };
        self.save_books(&books)?;
        self.books = books;
        Ok(book)
    }

    /// Remove a book. Returns the removed record, or `None` when the id was
    /// not in the collection.
    pub fn remove(&mut self, id: BookId) -> Result<Option<Book>> {
        let Some(index) = self.books.iter().position(|book| book.id == id) else {
            warn!(id, "remove requested for a book that is not in the library");
            return Ok(None);
        };
        let mut books = self.books.clone();
        let removed = books.remove(index);
        self.save_books(&books)?;
        self.books = books;
        Ok(Some(removed))
    }

    /// Millisecond timestamp, bumped past the largest id already in use.
    fn next_id(&self) -> Result<BookId> {
        let now = creation_timestamp().timestamp_millis();
        match self.books.iter().map(|book| book.id).max() {
            Some(max) if now <= max => max
                .checked_add(1)
                .ok_or_else(|| anyhow!("no book id left after {max}")),
            _ => Ok(now),
        }
    }

    fn save_books(&self, books: &[Book]) -> Result<()> {
        let json = serde_json::to_string(books).context("failed to encode books")?;
        self.storage
            .save(BOOKS_KEY, &json)
            .context("failed to save books")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn draft(title: &str, author: &str, year: Option<i32>) -> BookDraft {
        BookDraft {
            title: title.to_string(),
            author: author.to_string(),
            category: "General".to_string(),
            year,
        }
    }

    fn library() -> (Library, MemoryStorage) {
        let storage = MemoryStorage::new();
        let library = Library::load(Box::new(storage.clone())).unwrap();
        (library, storage)
    }

    fn saved_books(storage: &MemoryStorage) -> Vec<Book> {
        serde_json::from_str(&storage.get(BOOKS_KEY).unwrap()).unwrap()
    }

    /// Storage that reads fine but refuses every write.
    struct FailingSaves;

    impl Persistence for FailingSaves {
        fn load(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn save(&self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow!("quota exceeded"))
        }
    }

    fn seeded(books: &[Book]) -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage
            .save(BOOKS_KEY, &serde_json::to_string(books).unwrap())
            .unwrap();
        storage
    }

    fn stored_book(id: BookId, title: &str) -> Book {
        Book {
            id,
            title: title.to_string(),
            author: String::new(),
            isbn: String::new(),
            category: "General".to_string(),
            year: None,
            created_at: creation_timestamp(),
        }
    }

    #[test]
    fn failed_save_leaves_collection_untouched() {
        let mut library = Library::load(Box::new(FailingSaves)).unwrap();
        assert!(library.submit(Submission::New(draft("Dune", "", None))).is_err());
        assert!(library.submit(Submission::New(draft("Dune", "", None))).is_err());
        assert!(library.books().is_empty());
        assert!(library.toggle_theme().is_err());
        assert_eq!(library.theme(), Theme::Dark);
    }

    #[test]
    fn failed_save_keeps_edits_and_removals_unapplied() {
        let storage = seeded(&[stored_book(1, "Dune")]);
        let mut library = Library::load(Box::new(storage)).unwrap();
        let books = library.books().to_vec();
        library.storage = Box::new(FailingSaves);

        assert!(library
            .submit(Submission::Edit(1, draft("Dune Messiah", "", None)))
            .is_err());
        assert!(library.remove(1).is_err());
        assert_eq!(library.books(), books.as_slice());
    }

    #[test]
    fn exhausted_ids_are_an_error_not_a_panic() {
        let storage = seeded(&[stored_book(i64::MAX, "Last")]);
        let mut library = Library::load(Box::new(storage.clone())).unwrap();
        assert!(library.submit(Submission::New(draft("Next", "", None))).is_err());
        assert_eq!(library.books().len(), 1);
        assert_eq!(saved_books(&storage).len(), 1);
    }

    #[test]
    fn empty_storage_starts_with_defaults() {
        let (library, _) = library();
        assert!(library.books().is_empty());
        assert_eq!(library.theme(), Theme::Dark);
        assert_eq!(library.sort(), SortOption::TitleAsc);
        assert_eq!(library.category_filter(), "All");
        assert!(library.visible_books().is_empty());
    }

    #[test]
    fn new_books_go_first_and_are_mirrored() {
        let (mut library, storage) = library();
        let first = library.submit(Submission::New(draft("Dune", "Herbert", Some(1965)))).unwrap();
        let second = library
            .submit(Submission::New(draft("  Emma  ", "Austen", None)))
            .unwrap();

        assert_eq!(second.title, "Emma");
        assert!(second.id > first.id);
        let ids: Vec<_> = library.books().iter().map(|book| book.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(saved_books(&storage), library.books().to_vec());
    }

    #[test]
    fn blank_title_changes_nothing() {
        let (mut library, storage) = library();
        let err = library
            .submit(Submission::New(draft("   ", "Nobody", None)))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CatalogError>(),
            Some(CatalogError::Validation(_))
        ));
        assert!(library.books().is_empty());
        assert_eq!(storage.get(BOOKS_KEY), None);
    }

    #[test]
    fn edit_keeps_identity_fields() {
        let (mut library, storage) = library();
        let original = library.submit(Submission::New(draft("Dune", "", None))).unwrap();
        let edited = library
            .submit(Submission::Edit(
                original.id,
                BookDraft {
                    title: "Dune Messiah".to_string(),
                    author: "Frank Herbert".to_string(),
                    category: "Fiction".to_string(),
                    year: Some(1969),
                },
            ))
            .unwrap();

        assert_eq!(edited.id, original.id);
        assert_eq!(edited.created_at, original.created_at);
        assert_eq!(edited.isbn, original.isbn);
        assert_eq!(edited.category, "Fiction");
        assert_eq!(library.books().len(), 1);
        assert_eq!(saved_books(&storage)[0].title, "Dune Messiah");
    }

    #[test]
    fn edit_of_unknown_id_is_not_found() {
        let (mut library, _) = library();
        let err = library
            .submit(Submission::Edit(42, draft("Ghost", "", None)))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CatalogError>(),
            Some(CatalogError::NotFound(42))
        ));
    }

    #[test]
    fn remove_drops_the_book_and_saves() {
        let (mut library, storage) = library();
        let book = library.submit(Submission::New(draft("Dune", "", None))).unwrap();
        assert_eq!(library.remove(book.id).unwrap().map(|b| b.id), Some(book.id));
        assert!(library.books().is_empty());
        assert!(saved_books(&storage).is_empty());
        assert!(library.remove(book.id).unwrap().is_none());
    }

    #[test]
    fn ids_are_bumped_past_existing_ones() {
        let storage = MemoryStorage::new();
        let far_future = i64::MAX - 10;
        let seeded = vec![Book {
            id: far_future,
            title: "Seed".to_string(),
            author: String::new(),
            isbn: String::new(),
            category: "General".to_string(),
            year: None,
            created_at: creation_timestamp(),
        }];
        storage
            .save(BOOKS_KEY, &serde_json::to_string(&seeded).unwrap())
            .unwrap();

        let mut library = Library::load(Box::new(storage)).unwrap();
        let book = library.submit(Submission::New(draft("Next", "", None))).unwrap();
        assert_eq!(book.id, far_future + 1);
    }

    #[test]
    fn theme_toggle_is_persisted_and_restored() {
        let (mut library, storage) = library();
        assert_eq!(library.toggle_theme().unwrap(), Theme::Light);
        assert_eq!(storage.get(THEME_KEY).as_deref(), Some("light"));

        let reloaded = Library::load(Box::new(storage)).unwrap();
        assert_eq!(reloaded.theme(), Theme::Light);
    }

    #[test]
    fn corrupt_books_fail_to_load() {
        let storage = MemoryStorage::new();
        storage.save(BOOKS_KEY, "{not json").unwrap();
        assert!(Library::load(Box::new(storage)).is_err());
    }

    #[test]
    fn visible_books_apply_filter_search_and_sort() {
        let (mut library, _) = library();
        for (title, author, category) in [
            ("Zen", "Pirsig", "General"),
            ("Algorithms", "Sedgewick", "Programming"),
            ("Clean Code", "Martin", "Programming"),
        ] {
            library
                .submit(Submission::New(BookDraft {
                    title: title.to_string(),
                    author: author.to_string(),
                    category: category.to_string(),
                    year: None,
                }))
                .unwrap();
        }

        let titles = |library: &Library| {
            library
                .visible_books()
                .into_iter()
                .map(|book| book.title)
                .collect::<Vec<_>>()
        };
        assert_eq!(titles(&library), vec!["Algorithms", "Clean Code", "Zen"]);

        library.set_category_filter("Programming");
        library.set_sort(SortOption::TitleDesc);
        assert_eq!(titles(&library), vec!["Clean Code", "Algorithms"]);

        library.set_search("MART");
        assert_eq!(titles(&library), vec!["Clean Code"]);

        library.set_category_filter("Fiction");
        assert!(library.visible_books().is_empty());
    }

    #[test]
    fn category_filter_cycles_and_wraps() {
        let (mut library, _) = library();
        assert_eq!(
            library.category_filter_options(),
            vec!["All", "General", "Programming", "Science", "Fiction", "History"]
        );
        library.cycle_category_filter(1);
        assert_eq!(library.category_filter(), "General");
        library.cycle_category_filter(-2);
        assert_eq!(library.category_filter(), "History");
    }

    #[test]
    fn sort_options_cycle_through_all_six() {
        let mut sort = SortOption::default();
        let mut seen = vec![sort.key()];
        for _ in 0..5 {
            sort = sort.next();
            seen.push(sort.key());
        }
        assert_eq!(
            seen,
            vec!["title_asc", "title_desc", "author_asc", "author_desc", "year_asc", "year_desc"]
        );
        assert_eq!(sort.next(), SortOption::TitleAsc);
    }
}
