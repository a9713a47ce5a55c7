//! Domain models shared by the record store, the HTTP facade, and the local
//! library. `Book` is the only record type; `BookFields` is the partial shape
//! used for creation and updates so arbitrary JSON never merges into a record
//! unchecked.

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CatalogError, Result};

/// Identity of a book within one store. The server uses SQLite row ids, the
/// local library uses millisecond timestamps; the two are never mixed.
pub type BookId = i64;

/// Category applied when a new book does not name one.
pub const DEFAULT_CATEGORY: &str = "General";

/// Categories offered by the form. Records may carry any other string too.
pub const SUGGESTED_CATEGORIES: &[&str] =
    &["General", "Programming", "Science", "Fiction", "History"];

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub author: String,
    /// Only the server ever fills this in; it takes part in server-side search.
    #[serde(default)]
    pub isbn: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub year: Option<i32>,
    /// Set once when the record is created and never touched again.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Author text for display; blank authors read as "Unknown".
    pub fn display_author(&self) -> &str {
        if self.author.trim().is_empty() {
            "Unknown"
        } else {
            &self.author
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Partial record accepted by create and update. Every field is optional;
/// `year` separates "not given" (`None`) from an explicit `null` (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookFields {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_year")]
    pub year: Option<Option<i32>>,
}

/// Validated input for a brand new record, before the store assigns identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub year: Option<i32>,
}

impl BookFields {
    /// Check the fields without consuming them.
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            normalize_title(title)?;
        }
        Ok(())
    }

    /// Turn the partial fields into a creatable record, applying defaults.
    /// Fails when the title is missing or blank.
    pub fn into_new_book(self) -> Result<NewBook> {
        let title = match self.title {
            Some(title) => normalize_title(&title)?,
            None => return Err(title_required()),
        };
        Ok(NewBook {
            title,
            author: self.author.unwrap_or_default(),
            isbn: self.isbn.unwrap_or_default(),
            category: self.category.unwrap_or_else(default_category),
            year: self.year.flatten(),
        })
    }

    /// Merge the given fields into `book`. Identity and creation time are not
    /// part of `BookFields`, so they cannot change here.
    pub fn apply_to(self, book: &mut Book) -> Result<()> {
        self.validate()?;
        if let Some(title) = self.title {
            book.title = normalize_title(&title)?;
        }
        if let Some(author) = self.author {
            book.author = author;
        }
        if let Some(isbn) = self.isbn {
            book.isbn = isbn;
        }
        if let Some(category) = self.category {
            book.category = category;
        }
        if let Some(year) = self.year {
            book.year = year;
        }
        Ok(())
    }
}

impl NewBook {
    pub fn into_book(self, id: BookId, created_at: DateTime<Utc>) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            category: self.category,
            year: self.year,
            created_at,
        }
    }
}

/// Creation time for a new record, truncated to the millisecond precision
/// both stores keep.
pub fn creation_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Trim a title and reject it when nothing is left.
pub fn normalize_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        Err(title_required())
    } else {
        Ok(title.to_string())
    }
}

fn title_required() -> CatalogError {
    CatalogError::validation("Title is required")
}

/// Years arrive either as JSON numbers or as the raw text of a form field.
#[derive(Deserialize)]
#[serde(untagged)]
enum YearInput {
    Number(i64),
    Text(String),
}

fn deserialize_year<'de, D>(deserializer: D) -> std::result::Result<Option<Option<i32>>, D::Error>
where
    D: Deserializer<'de>,
{
    let year = match Option::<YearInput>::deserialize(deserializer)? {
        None => None,
        Some(YearInput::Number(number)) => Some(
            i32::try_from(number)
                .map_err(|_| D::Error::custom(format!("year {number} is out of range")))?,
        ),
        Some(YearInput::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.parse::<i32>().map_err(|_| {
                    D::Error::custom(format!("year must be a number, got {text:?}"))
                })?)
            }
        }
    };
    Ok(Some(year))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> BookFields {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn new_book_applies_defaults() {
        let book = fields(json!({ "title": "  Dune  " })).into_new_book().unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "");
        assert_eq!(book.isbn, "");
        assert_eq!(book.category, "General");
        assert_eq!(book.year, None);
    }

    #[test]
    fn blank_or_missing_title_is_rejected() {
        for body in [json!({}), json!({ "title": "" }), json!({ "title": "   " })] {
            let err = fields(body).into_new_book().unwrap_err();
            assert!(matches!(err, CatalogError::Validation(_)));
        }
    }

    #[test]
    fn year_accepts_numbers_strings_and_null() {
        assert_eq!(fields(json!({ "year": 1990 })).year, Some(Some(1990)));
        assert_eq!(fields(json!({ "year": "2015" })).year, Some(Some(2015)));
        assert_eq!(fields(json!({ "year": "" })).year, Some(None));
        assert_eq!(fields(json!({ "year": null })).year, Some(None));
        assert_eq!(fields(json!({})).year, None);
        assert!(serde_json::from_value::<BookFields>(json!({ "year": "soon" })).is_err());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let parsed = fields(json!({ "title": "x", "_id": "abc", "createdAt": "now" }));
        assert_eq!(parsed.title.as_deref(), Some("x"));
    }

    #[test]
    fn apply_keeps_identity_and_unspecified_fields() {
        let created_at = Utc::now();
        let mut book = NewBook {
            title: "Old".into(),
            author: "Someone".into(),
            isbn: "123".into(),
            category: "Science".into(),
            year: Some(2001),
        }
        .into_book(7, created_at);

        fields(json!({ "title": "New", "year": null }))
            .apply_to(&mut book)
            .unwrap();

        assert_eq!(book.id, 7);
        assert_eq!(book.created_at, created_at);
        assert_eq!(book.title, "New");
        assert_eq!(book.author, "Someone");
        assert_eq!(book.category, "Science");
        assert_eq!(book.year, None);
    }

    #[test]
    fn apply_rejects_blank_title_without_touching_record() {
        let mut book = NewBook {
            title: "Keep".into(),
            author: String::new(),
            isbn: String::new(),
            category: "General".into(),
            year: None,
        }
        .into_book(1, Utc::now());
        let before = book.clone();

        let err = fields(json!({ "title": " ", "author": "X" }))
            .apply_to(&mut book)
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert_eq!(book, before);
    }

    #[test]
    fn record_json_uses_camel_case() {
        let book = NewBook {
            title: "T".into(),
            author: String::new(),
            isbn: String::new(),
            category: "General".into(),
            year: Some(1999),
        }
        .into_book(3, Utc::now());
        let value = serde_json::to_value(&book).unwrap();
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["year"], 1999);
        assert_eq!(book.display_author(), "Unknown");
    }
}
