use std::cmp::min;
use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tracing::info;

use crate::error::CatalogError;
use crate::models::{Book, BookId};

use super::forms::{BookField, BookForm, ConfirmDelete};
use super::helpers::{book_card_lines, centered_rect, surface_error};
use super::library::Library;
use super::theme::Palette;

/// Height reserved for the footer (status line plus key hints).
const FOOTER_HEIGHT: u16 = 4;
/// Three lines of text plus the card border.
const BOOK_CARD_HEIGHT: u16 = 5;
const SEARCH_PREFIX: &str = "Search: ";

/// What the keyboard is currently driving.
enum Mode {
    Normal,
    Searching,
    Form(BookForm),
    ConfirmDelete(ConfirmDelete),
    /// Blocking notice shown over the form it came from.
    Alert {
        message: String,
        form: BookForm,
    },
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self, palette: Palette) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(palette.info),
            StatusKind::Error => Style::default().fg(palette.error),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    library: Library,
    selected: usize,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(library: Library) -> Self {
        Self {
            library,
            selected: 0,
            mode: Mode::Normal,
            status: None,
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Feed one key press through the current mode. Returns `true` when the
    /// user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Searching => self.handle_search(code),
            Mode::Form(form) => self.handle_form(code, form)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
            Mode::Alert { message, form } => self.handle_alert(code, message, form),
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-5),
            KeyCode::PageDown => self.move_selection(5),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.visible_count().saturating_sub(1),
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                return Ok(Mode::Form(BookForm::default()));
            }
            KeyCode::Char('e') | KeyCode::Enter => match self.current_book() {
                Some(book) => {
                    self.clear_status();
                    return Ok(Mode::Form(BookForm::from_book(&book)));
                }
                None => self.set_status("No book selected.", StatusKind::Error),
            },
            KeyCode::Char('-') | KeyCode::Char('d') | KeyCode::Delete => {
                match self.current_book() {
                    Some(book) => return Ok(Mode::ConfirmDelete(ConfirmDelete::from(&book))),
                    None => self.set_status("No book selected.", StatusKind::Error),
                }
            }
            KeyCode::Char('f') | KeyCode::Char('/') => {
                self.clear_status();
                return Ok(Mode::Searching);
            }
            KeyCode::Char('c') => self.cycle_category(1),
            KeyCode::Char('C') => self.cycle_category(-1),
            KeyCode::Char('s') => {
                self.library.cycle_sort();
                self.set_status(
                    format!("Sorted by {}.", self.library.sort().label()),
                    StatusKind::Info,
                );
            }
            KeyCode::Char('t') => match self.library.toggle_theme() {
                Ok(theme) => {
                    info!(theme = theme.as_str(), "theme changed");
                    self.clear_status();
                }
                Err(err) => self.set_status(surface_error(&err), StatusKind::Error),
            },
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_search(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Esc => {
                self.library.set_search("");
                self.selected = 0;
                self.set_status("Search cleared.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Enter => return Mode::Normal,
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Backspace => {
                let mut search = self.library.search().to_string();
                search.pop();
                self.library.set_search(search);
                self.selected = 0;
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                let mut search = self.library.search().to_string();
                search.push(ch);
                self.library.set_search(search);
                self.selected = 0;
            }
            _ => {}
        }
        Mode::Searching
    }

    fn handle_form(&mut self, code: KeyCode, mut form: BookForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                let message = if form.is_editing() {
                    "Edit cancelled."
                } else {
                    "Add cancelled."
                };
                self.set_status(message, StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::Down => form.toggle_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Left if form.active == BookField::Category => form.cycle_category(-1),
            KeyCode::Right if form.active == BookField::Category => form.cycle_category(1),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => return self.submit_form(form),
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::Form(form))
    }

    fn submit_form(&mut self, mut form: BookForm) -> Result<Mode> {
        let submission = match form.to_submission() {
            Ok(submission) => submission,
            Err(err) => {
                let message = surface_error(&err);
                form.error = Some(message.clone());
                self.set_status(message, StatusKind::Error);
                return Ok(Mode::Form(form));
            }
        };

        match self.library.submit(submission) {
            Ok(book) => {
                let verb = if form.is_editing() { "Saved" } else { "Added" };
                info!(id = book.id, "{} book", verb.to_lowercase());
                self.set_status(format!("{verb} \"{}\".", book.title), StatusKind::Info);
                self.focus_book(book.id);
                Ok(Mode::Normal)
            }
            Err(err) => {
                if let Some(CatalogError::Validation(message)) = err.downcast_ref::<CatalogError>()
                {
                    return Ok(Mode::Alert {
                        message: message.clone(),
                        form,
                    });
                }
                let message = surface_error(&err);
                form.error = Some(message.clone());
                self.set_status(message, StatusKind::Error);
                Ok(Mode::Form(form))
            }
        }
    }

    fn handle_alert(&mut self, code: KeyCode, message: String, form: BookForm) -> Mode {
        match code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => Mode::Form(form),
            _ => Mode::Alert { message, form },
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Removal cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.library.remove(confirm.id) {
                    Ok(Some(book)) => {
                        info!(id = book.id, "removed book");
                        self.set_status(format!("Removed \"{}\".", book.title), StatusKind::Info);
                        self.clamp_selection();
                        Mode::Normal
                    }
                    Ok(None) => {
                        self.set_status("That book was already removed.", StatusKind::Info);
                        self.clamp_selection();
                        Mode::Normal
                    }
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Mode::ConfirmDelete(confirm)
                    }
                }
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let palette = self.library.theme().palette();
        frame.render_widget(
            Block::default().style(Style::default().bg(palette.background).fg(palette.text)),
            area,
        );

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        let visible = self.library.visible_books();
        self.draw_header(frame, chunks[0], palette);
        self.draw_controls(frame, chunks[1], palette);
        self.draw_books(frame, chunks[2], &visible, palette);
        self.draw_footer(frame, chunks[3], palette);

        match &self.mode {
            Mode::Form(form) => self.draw_form(frame, area, form, palette),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm, palette),
            Mode::Alert { message, form } => {
                self.draw_form(frame, area, form, palette);
                self.draw_alert(frame, area, message, palette);
            }
            Mode::Normal | Mode::Searching => {}
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect, palette: Palette) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.muted));
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let toggle = format!("[t] {}", self.library.theme().toggle_label());
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(toggle.len() as u16)])
            .split(inner);

        let title = Paragraph::new(Line::from(Span::styled(
            "Library Management",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )));
        frame.render_widget(title, columns[0]);
        frame.render_widget(
            Paragraph::new(toggle)
                .alignment(Alignment::Right)
                .style(Style::default().fg(palette.muted)),
            columns[1],
        );
    }

    fn draw_controls(&self, frame: &mut Frame, area: Rect, palette: Palette) {
        let searching = matches!(self.mode, Mode::Searching);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(if searching {
                Style::default().fg(palette.highlight)
            } else {
                Style::default().fg(palette.muted)
            });
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let search = self.library.search();
        let search_span = if search.is_empty() && !searching {
            Span::styled("<title or author>", Style::default().fg(palette.muted))
        } else {
            Span::raw(search.to_string())
        };
        let line = Line::from(vec![
            Span::raw(SEARCH_PREFIX),
            search_span,
            Span::raw("   Category: "),
            Span::styled(
                self.library.category_filter().to_string(),
                Style::default().fg(palette.accent),
            ),
            Span::raw("   Sort: "),
            Span::styled(
                self.library.sort().label(),
                Style::default().fg(palette.accent),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), inner);

        if searching {
            let cursor_x = inner.x + SEARCH_PREFIX.len() as u16 + search.chars().count() as u16;
            frame.set_cursor_position((cursor_x, inner.y));
        }
    }

    fn draw_books(&self, frame: &mut Frame, area: Rect, books: &[Book], palette: Palette) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.muted))
            .title(format!(" Books ({}) ", books.len()));
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        if books.is_empty() {
            let empty = Paragraph::new(Span::styled(
                "No books found.",
                Style::default().fg(palette.muted),
            ))
            .alignment(Alignment::Center);
            frame.render_widget(empty, inner);
            return;
        }

        self.render_book_cards(frame, inner, books, palette);
    }

    fn render_book_cards(&self, frame: &mut Frame, area: Rect, books: &[Book], palette: Palette) {
        if area.height == 0 {
            return;
        }

        let selected = min(self.selected, books.len() - 1);
        let capacity = ((area.height / BOOK_CARD_HEIGHT) as usize).max(1);
        let mut start = if selected >= capacity {
            selected + 1 - capacity
        } else {
            0
        };
        if start + capacity > books.len() {
            start = books.len().saturating_sub(capacity);
        }
        let end = min(start + capacity, books.len());

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Length(BOOK_CARD_HEIGHT); end - start])
            .split(area);

        for (chunk, index) in rows.iter().zip(start..end) {
            if chunk.height == 0 {
                continue;
            }
            let is_selected = index == selected;
            let border_style = if is_selected {
                Style::default().fg(palette.highlight)
            } else {
                Style::default().fg(palette.muted)
            };
            let block = Block::default().borders(Borders::ALL).border_style(border_style);
            let paragraph = Paragraph::new(book_card_lines(&books[index], palette, is_selected))
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, *chunk);
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect, palette: Palette) {
        let block = Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(palette.muted));
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = match &self.status {
            Some(status) => Line::from(Span::styled(
                status.text.clone(),
                status.kind.style(palette),
            )),
            None => Line::from(""),
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions(palette)])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self, palette: Palette) -> Line<'static> {
        let key_style = Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD);
        let hints: &[(&str, &str)] = match &self.mode {
            Mode::Normal => &[
                ("[+]", " Add   "),
                ("[e]", " Edit   "),
                ("[-]", " Delete   "),
                ("[f]", " Search   "),
                ("[c]", " Category   "),
                ("[s]", " Sort   "),
                ("[t]", " Theme   "),
                ("[q]", " Quit"),
            ],
            Mode::Searching => &[
                ("[Enter]", " Done   "),
                ("[Esc]", " Clear   "),
                ("[↑↓]", " Navigate"),
            ],
            Mode::Form(_) => &[
                ("[Tab]", " Next field   "),
                ("[←→]", " Category   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            Mode::ConfirmDelete(_) => &[("[y]", " Remove   "), ("[n]", " Keep")],
            Mode::Alert { .. } => &[("[Enter]", " Dismiss")],
        };

        Line::from(
            hints
                .iter()
                .flat_map(|(key, label)| {
                    [
                        Span::styled(key.to_string(), key_style),
                        Span::raw(label.to_string()),
                    ]
                })
                .collect::<Vec<_>>(),
        )
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, form: &BookForm, palette: Palette) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let title = if form.is_editing() { "Edit Book" } else { "Add Book" };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .style(Style::default().bg(palette.background).fg(palette.text));
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let fields = [
            ("Title", BookField::Title),
            ("Author", BookField::Author),
            ("Year", BookField::Year),
            ("Category", BookField::Category),
        ];
        let mut lines: Vec<Line> = fields
            .iter()
            .map(|(name, field)| form.build_line(name, *field))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(palette.error),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(palette.muted),
            )));
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        if form.active != BookField::Category {
            let row = fields
                .iter()
                .position(|(_, field)| *field == form.active)
                .unwrap_or(0);
            let (name, _) = fields[row];
            let prefix = format!("{name}: ").len() as u16;
            frame.set_cursor_position((
                inner.x + prefix + form.value_len(form.active) as u16,
                inner.y + row as u16,
            ));
        }
    }

    fn draw_confirm_delete(
        &self,
        frame: &mut Frame,
        area: Rect,
        confirm: &ConfirmDelete,
        palette: Palette,
    ) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Removal")
            .borders(Borders::ALL)
            .style(Style::default().bg(palette.background).fg(palette.text));
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Remove \"{}\" from the library?", confirm.title)),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(palette.muted),
            )),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
    }

    fn draw_alert(&self, frame: &mut Frame, area: Rect, message: &str, palette: Palette) {
        let popup_area = centered_rect(40, 20, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Notice")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.error))
            .style(Style::default().bg(palette.background).fg(palette.text));
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(message.to_string()),
            Line::from(Span::styled(
                "Press Enter to continue.",
                Style::default().fg(palette.muted),
            )),
        ];
        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            inner,
        );
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn visible_count(&self) -> usize {
        self.library.visible_books().len()
    }

    fn current_book(&self) -> Option<Book> {
        self.library.visible_books().into_iter().nth(self.selected)
    }

    fn move_selection(&mut self, offset: isize) {
        let count = self.visible_count();
        if count == 0 {
            self.selected = 0;
            return;
        }
        let next = (self.selected as isize + offset).clamp(0, count as isize - 1);
        self.selected = next as usize;
    }

    fn clamp_selection(&mut self) {
        self.selected = min(self.selected, self.visible_count().saturating_sub(1));
    }

    /// Select `id` when it is visible, otherwise keep the selection in range.
    fn focus_book(&mut self, id: BookId) {
        match self
            .library
            .visible_books()
            .iter()
            .position(|book| book.id == id)
        {
            Some(index) => self.selected = index,
            None => self.clamp_selection(),
        }
    }

    fn cycle_category(&mut self, offset: isize) {
        self.library.cycle_category_filter(offset);
        self.selected = 0;
        self.set_status(
            format!("Category: {}.", self.library.category_filter()),
            StatusKind::Info,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::ui::library::{BOOKS_KEY, THEME_KEY};
    use crate::ui::theme::Theme;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn app() -> (App, MemoryStorage) {
        let storage = MemoryStorage::new();
        let library = Library::load(Box::new(storage.clone())).unwrap();
        (App::new(library), storage)
    }

    fn press(app: &mut App, keys: &[KeyCode]) {
        for key in keys {
            assert!(!app.handle_key(*key).unwrap());
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    fn add_book(app: &mut App, title: &str, author: &str, year: &str) {
        press(app, &[KeyCode::Char('+')]);
        type_text(app, title);
        press(app, &[KeyCode::Tab]);
        type_text(app, author);
        press(app, &[KeyCode::Tab]);
        type_text(app, year);
        press(app, &[KeyCode::Enter]);
    }

    fn rendered(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn quit_keys_exit() {
        let (mut app, _) = app();
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }

    #[test]
    fn adding_a_book_saves_and_selects_it() {
        let (mut app, storage) = app();
        add_book(&mut app, "Dune", "Frank Herbert", "1965");

        assert!(matches!(app.mode, Mode::Normal));
        let books = app.library().books();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].year, Some(1965));
        assert!(storage.get(BOOKS_KEY).unwrap().contains("Dune"));
        assert_eq!(app.current_book().map(|book| book.title), Some("Dune".to_string()));
    }

    #[test]
    fn empty_title_raises_alert_and_returns_to_form() {
        let (mut app, storage) = app();
        press(&mut app, &[KeyCode::Char('+'), KeyCode::Enter]);
        assert!(matches!(app.mode, Mode::Alert { .. }));
        assert!(app.library().books().is_empty());
        assert_eq!(storage.get(BOOKS_KEY), None);

        press(&mut app, &[KeyCode::Enter]);
        assert!(matches!(app.mode, Mode::Form(_)));
    }

    #[test]
    fn editing_keeps_the_record_identity() {
        let (mut app, _) = app();
        add_book(&mut app, "Dune", "", "");
        let original = app.library().books()[0].clone();

        press(&mut app, &[KeyCode::Char('e')]);
        type_text(&mut app, " Messiah");
        press(&mut app, &[KeyCode::Enter]);

        let edited = &app.library().books()[0];
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.created_at, original.created_at);
        assert_eq!(edited.title, "Dune Messiah");
    }

    #[test]
    fn cancelling_an_edit_changes_nothing() {
        let (mut app, _) = app();
        add_book(&mut app, "Dune", "", "");
        press(&mut app, &[KeyCode::Char('e')]);
        type_text(&mut app, " draft");
        press(&mut app, &[KeyCode::Esc]);
        assert_eq!(app.library().books()[0].title, "Dune");
    }

    #[test]
    fn removal_requires_confirmation() {
        let (mut app, _) = app();
        add_book(&mut app, "Dune", "", "");

        press(&mut app, &[KeyCode::Char('d'), KeyCode::Char('n')]);
        assert_eq!(app.library().books().len(), 1);

        press(&mut app, &[KeyCode::Char('d'), KeyCode::Char('y')]);
        assert!(app.library().books().is_empty());
    }

    #[test]
    fn search_narrows_and_escape_clears() {
        let (mut app, _) = app();
        add_book(&mut app, "Dune", "Herbert", "");
        add_book(&mut app, "Emma", "Austen", "");

        press(&mut app, &[KeyCode::Char('/')]);
        type_text(&mut app, "aus");
        assert_eq!(app.visible_count(), 1);
        press(&mut app, &[KeyCode::Enter]);
        assert_eq!(app.library().search(), "aus");

        press(&mut app, &[KeyCode::Char('f'), KeyCode::Esc]);
        assert_eq!(app.library().search(), "");
        assert_eq!(app.visible_count(), 2);
    }

    #[test]
    fn theme_key_toggles_and_persists() {
        let (mut app, storage) = app();
        press(&mut app, &[KeyCode::Char('t')]);
        assert_eq!(app.library().theme(), Theme::Light);
        assert_eq!(storage.get(THEME_KEY).as_deref(), Some("light"));
    }

    #[test]
    fn empty_view_renders_placeholder() {
        let (app, _) = app();
        let screen = rendered(&app);
        assert!(screen.contains("Library Management"));
        assert!(screen.contains("No books found."));
        assert!(screen.contains("Light Mode"));
    }

    #[test]
    fn cards_show_author_category_and_year() {
        let (mut app, _) = app();
        add_book(&mut app, "Dune", "", "1965");
        let screen = rendered(&app);
        assert!(screen.contains("Dune"));
        assert!(screen.contains("Unknown • General"));
        assert!(screen.contains("1965"));
        assert!(!screen.contains("No books found."));
    }
}
