use anyhow::{Context, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Book, BookId, DEFAULT_CATEGORY, SUGGESTED_CATEGORIES};

use super::library::{BookDraft, Submission};

/// Internal representation of the add/edit book form.
#[derive(Clone)]
pub(crate) struct BookForm {
    pub(crate) editing: Option<BookId>,
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) year: String,
    pub(crate) category: String,
    /// Category of the record being edited when it is not a suggested one,
    /// so cycling away from it can come back.
    custom_category: Option<String>,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
}

/// Fields available within the book form.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    Year,
    Category,
}

impl Default for BookForm {
    fn default() -> Self {
        Self {
            editing: None,
            title: String::new(),
            author: String::new(),
            year: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            custom_category: None,
            active: BookField::Title,
            error: None,
        }
    }
}

impl BookForm {
    /// Populate the form from an existing book when editing.
    pub(crate) fn from_book(book: &Book) -> Self {
        let custom_category = (!SUGGESTED_CATEGORIES.contains(&book.category.as_str()))
            .then(|| book.category.clone());
        Self {
            editing: Some(book.id),
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year.map(|year| year.to_string()).unwrap_or_default(),
            category: book.category.clone(),
            custom_category,
            active: BookField::Title,
            error: None,
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Move focus forward through the four fields.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            BookField::Title => BookField::Author,
            BookField::Author => BookField::Year,
            BookField::Year => BookField::Category,
            BookField::Category => BookField::Title,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            BookField::Title => BookField::Category,
            BookField::Author => BookField::Title,
            BookField::Year => BookField::Author,
            BookField::Category => BookField::Year,
        };
    }

    /// Append a character to the active field. The year only takes digits and
    /// the category is chosen with [`BookForm::cycle_category`].
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            BookField::Title => self.title.push(ch),
            BookField::Author => self.author.push(ch),
            BookField::Year => {
                if !ch.is_ascii_digit() {
                    return false;
                }
                self.year.push(ch);
            }
            BookField::Category => return false,
        }
        true
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            BookField::Title => {
                self.title.pop();
            }
            BookField::Author => {
                self.author.pop();
            }
            BookField::Year => {
                self.year.pop();
            }
            BookField::Category => {}
        }
    }

    fn category_choices(&self) -> Vec<String> {
        let mut choices: Vec<String> = SUGGESTED_CATEGORIES
            .iter()
            .map(|category| category.to_string())
            .collect();
        if let Some(custom) = &self.custom_category {
            choices.push(custom.clone());
        }
        choices
    }

    /// Step the category through the suggested set.
    pub(crate) fn cycle_category(&mut self, offset: isize) {
        let choices = self.category_choices();
        let len = choices.len() as isize;
        let current = choices
            .iter()
            .position(|choice| *choice == self.category)
            .map(|index| index as isize)
            .unwrap_or(0);
        self.category = choices[(current + offset).rem_euclid(len) as usize].clone();
    }

    /// Turn the inputs into a submission. Title checks happen in the library
    /// so an empty title reaches it and can be reported there.
    pub(crate) fn to_submission(&self) -> Result<Submission> {
        let year_raw = self.year.trim();
        let year = if year_raw.is_empty() {
            None
        } else {
            Some(
                year_raw
                    .parse::<i32>()
                    .context("Year must be a number.")?,
            )
        };
        let draft = BookDraft {
            title: self.title.clone(),
            author: self.author.clone(),
            category: self.category.clone(),
            year,
        };
        Ok(match self.editing {
            Some(id) => Submission::Edit(id, draft),
            None => Submission::New(draft),
        })
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field_name: &str, field: BookField) -> Line<'static> {
        let is_active = self.active == field;
        let value = match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Year => &self.year,
            BookField::Category => &self.category,
        };

        let display = match field {
            BookField::Category => format!("< {value} >"),
            BookField::Title if value.is_empty() => "<required>".to_string(),
            _ if value.is_empty() => "<optional>".to_string(),
            _ => value.clone(),
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }

    /// Return the character count for the requested field.
    pub(crate) fn value_len(&self, field: BookField) -> usize {
        match field {
            BookField::Title => self.title.chars().count(),
            BookField::Author => self.author.chars().count(),
            BookField::Year => self.year.chars().count(),
            BookField::Category => self.category.chars().count(),
        }
    }
}

/// State for confirming the removal of a book.
#[derive(Clone)]
pub(crate) struct ConfirmDelete {
    pub(crate) id: BookId,
    pub(crate) title: String,
}

impl ConfirmDelete {
    pub(crate) fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
        }
    }
}
