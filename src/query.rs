//! The query pipeline: category filter, then text search, then sort.
//!
//! `BookQuery::apply` evaluates the pipeline in memory over any slice of
//! books. The SQLite store evaluates the same request in SQL (see
//! `db::books::fetch_books`), sharing `fold_case`, `SortSpec`, and the
//! accessors on `BookQuery` so both paths read a request identically.
//!
//! Every stage is a pure function of its input: the caller's slice is never
//! reordered or mutated and a fresh `Vec` comes back each time.

use serde::Deserialize;

use crate::models::Book;

/// Category filter value meaning "no restriction".
pub const ALL_CATEGORIES: &str = "All";

/// Case folding used for search and string comparison on both the in-memory
/// and the SQL side.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Category choices with the "All" sentinel first and every other value once,
/// in first-seen order.
pub fn category_options<I, S>(categories: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = vec![ALL_CATEGORIES.to_string()];
    for category in categories {
        let category = category.as_ref();
        if !options.iter().any(|existing| existing == category) {
            options.push(category.to_string());
        }
    }
    options
}

/// A list request as it arrives from the query string or the UI controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
}

/// Which text columns the search stage looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFields {
    /// Title and author; what the local library searches.
    TitleAuthor,
    /// Title, author and isbn; what the server searches.
    TitleAuthorIsbn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Author,
    Year,
    CreatedAt,
    /// Anything else. Every record gets the same (absent) key, so the order
    /// of the input survives untouched.
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Newest first; used whenever a request carries no sort.
    pub const DEFAULT: SortSpec = SortSpec {
        field: SortField::CreatedAt,
        direction: SortDirection::Desc,
    };

    /// Parse `"<field>_<direction>"`. Only the first two `_`-separated pieces
    /// count; a direction other than `desc` sorts ascending.
    pub fn parse(raw: &str) -> SortSpec {
        let mut parts = raw.split('_');
        let field = match parts.next().unwrap_or_default() {
            "title" => SortField::Title,
            "author" => SortField::Author,
            "year" => SortField::Year,
            "createdAt" => SortField::CreatedAt,
            _ => SortField::Unrecognized,
        };
        let direction = match parts.next() {
            Some("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        };
        SortSpec { field, direction }
    }
}

/// Comparison key for one record under one sort field. Variant order is the
/// cross-type order: absent values first, then numbers, then strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Absent,
    Number(i64),
    Text(String),
}

fn sort_key(book: &Book, field: SortField) -> SortKey {
    match field {
        SortField::Title => SortKey::Text(fold_case(&book.title)),
        SortField::Author => SortKey::Text(fold_case(&book.author)),
        SortField::Year => book
            .year
            .map(|year| SortKey::Number(i64::from(year)))
            .unwrap_or(SortKey::Absent),
        SortField::CreatedAt => SortKey::Number(book.created_at.timestamp_millis()),
        SortField::Unrecognized => SortKey::Absent,
    }
}

impl BookQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// The category to filter on, or `None` when absent, empty, or "All".
    pub fn category_filter(&self) -> Option<&str> {
        self.category
            .as_deref()
            .filter(|category| !category.is_empty() && *category != ALL_CATEGORIES)
    }

    /// The folded search needle, or `None` when there is nothing to search.
    pub fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|search| !search.is_empty())
            .map(fold_case)
    }

    /// The requested ordering, falling back to newest-first.
    pub fn sort_spec(&self) -> SortSpec {
        match self.sort.as_deref() {
            Some(raw) if !raw.is_empty() => SortSpec::parse(raw),
            _ => SortSpec::DEFAULT,
        }
    }

    /// Run the whole pipeline over `books` and return the matching records in
    /// order.
    pub fn apply(&self, books: &[Book], fields: SearchFields) -> Vec<Book> {
        let by_category = filter_category(books.iter(), self.category_filter());
        let searched = filter_search(by_category, self.search_needle().as_deref(), fields);
        sort_books(searched, self.sort_spec())
            .into_iter()
            .cloned()
            .collect()
    }
}

fn filter_category<'a>(
    books: impl Iterator<Item = &'a Book>,
    category: Option<&str>,
) -> Vec<&'a Book> {
    match category {
        Some(category) => books.filter(|book| book.category == category).collect(),
        None => books.collect(),
    }
}

fn filter_search<'a>(
    books: Vec<&'a Book>,
    needle: Option<&str>,
    fields: SearchFields,
) -> Vec<&'a Book> {
    let Some(needle) = needle else {
        return books;
    };
    books
        .into_iter()
        .filter(|book| matches_search(book, needle, fields))
        .collect()
}

fn matches_search(book: &Book, needle: &str, fields: SearchFields) -> bool {
    fold_case(&book.title).contains(needle)
        || fold_case(&book.author).contains(needle)
        || (fields == SearchFields::TitleAuthorIsbn && fold_case(&book.isbn).contains(needle))
}

/// Stable sort over the filtered subset. Descending order reverses the key
/// comparison only, so equal keys still keep their input order.
fn sort_books(books: Vec<&Book>, spec: SortSpec) -> Vec<&Book> {
    if spec.field == SortField::Unrecognized {
        return books;
    }
    let mut keyed: Vec<(SortKey, &Book)> = books
        .into_iter()
        .map(|book| (sort_key(book, spec.field), book))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| match spec.direction {
        SortDirection::Asc => a.cmp(b),
        SortDirection::Desc => b.cmp(a),
    });
    keyed.into_iter().map(|(_, book)| book).collect()
}
