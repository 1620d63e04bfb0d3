use chrono::Local;
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::cli::form_view::{FormAction, FormView};
use crate::form::{FormKind, TicketForm};
use crate::grid::{GridController, GridState};
use crate::repository::{Notice, Repository};
use crate::schema::TicketTable;
use crate::store::RecordStore;
use crate::tui::{
    notice_line, CURSOR_STYLE, DIRTY_STYLE, FOOTER_STYLE, HEADER_STYLE, READ_ONLY_STYLE,
    SELECTED_STYLE,
};

/// Notices shown under the grid.
const NOTICE_LINES: usize = 4;

enum GridMode {
    Normal,
    EditCell(String),
    Form(FormView),
}

pub enum GridAction {
    Continue,
    Close,
    Save,
    Reload,
    OpenForm,
    SubmitForm,
}

/// Interactive editor over a [`GridController`], with a new-ticket form panel.
pub struct GridBrowser {
    grid: GridController,
    selected: usize,
    column: usize,
    mode: GridMode,
    status_message: Option<Notice>,
    table_state: TableState,
}

impl GridBrowser {
    pub fn new(grid: GridController) -> Self {
        Self {
            grid,
            selected: 0,
            column: 0,
            mode: GridMode::Normal,
            status_message: None,
            table_state: TableState::default(),
        }
    }

    pub fn grid(&self) -> &GridController {
        &self.grid
    }

    fn title(&self) -> &'static str {
        match self.grid.table() {
            TicketTable::Badging => "Badging Tickets",
            TicketTable::Live => "Live Dispatches",
            TicketTable::Directory => "Technicians & Sites",
        }
    }

    fn column_name(&self) -> &'static str {
        self.grid.working().schema.columns[self.column].name
    }

    fn clamp_selection(&mut self) {
        let rows = self.grid.working().len();
        self.selected = self.selected.min(rows.saturating_sub(1));
    }

    pub fn draw_frame(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let form_height = match &self.mode {
            GridMode::Form(view) => view.height(),
            _ => 0,
        };

        let [title_area, table_area, form_area, notice_area, keys_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(form_height),
            Constraint::Length(NOTICE_LINES as u16),
            Constraint::Length(1),
        ])
        .areas(area);

        let state = match self.grid.state() {
            GridState::Unloaded => "not loaded",
            GridState::Loaded => "saved",
            GridState::Dirty => "unsaved changes",
            GridState::Saving => "saving",
            GridState::Error => "save failed",
        };
        frame.render_widget(
            Paragraph::new(format!(
                " {} ({} rows, {state})",
                self.title(),
                self.grid.working().len()
            ))
            .style(HEADER_STYLE),
            title_area,
        );

        let table = self.grid.working();
        let columns = table.schema.columns;
        let diff = self.grid.diff();

        let mut header: Vec<Cell> = vec![Cell::from("ID")];
        header.extend(columns.iter().map(|c| {
            let cell = Cell::from(c.label);
            if c.is_editable() {
                cell
            } else {
                cell.style(READ_ONLY_STYLE)
            }
        }));

        let rows: Vec<Row> = table
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut cells = vec![Cell::from(
                    row.id.map(|id| id.to_string()).unwrap_or_default(),
                )];
                for (c, (col, value)) in columns.iter().zip(&row.cells).enumerate() {
                    let text = match (&self.mode, i == self.selected && c == self.column) {
                        (GridMode::EditCell(input), true) => format!("{input}\u{2588}"),
                        _ => value.display(col.kind),
                    };
                    let mut cell = Cell::from(text);
                    if i == self.selected && c == self.column {
                        cell = cell.style(CURSOR_STYLE);
                    } else if diff.get(&i).is_some_and(|d| d.contains_key(col.name)) {
                        cell = cell.style(DIRTY_STYLE);
                    } else if !col.is_editable() {
                        cell = cell.style(READ_ONLY_STYLE);
                    }
                    cells.push(cell);
                }
                Row::new(cells)
            })
            .collect();

        let mut widths = vec![Constraint::Length(6)];
        widths.extend(columns.iter().map(|_| Constraint::Min(8)));

        self.table_state.select((!table.is_empty()).then_some(self.selected));
        let widget = Table::new(rows, widths)
            .header(Row::new(header).style(HEADER_STYLE).bottom_margin(1))
            .column_spacing(1)
            .row_highlight_style(SELECTED_STYLE);
        frame.render_stateful_widget(widget, table_area, &mut self.table_state);

        if let GridMode::Form(view) = &self.mode {
            view.draw(frame, form_area);
        }

        let mut notices: Vec<Line> = self
            .grid
            .notices()
            .iter()
            .rev()
            .take(NOTICE_LINES - 1)
            .rev()
            .map(notice_line)
            .collect();
        if let Some(n) = &self.status_message {
            notices.push(notice_line(n));
        }
        frame.render_widget(Paragraph::new(notices), notice_area);

        let keys = match &self.mode {
            GridMode::Normal => {
                "\u{2191}/\u{2193}/\u{2190}/\u{2192}:move  e:edit  s:save  r:reload  n:new ticket  q:back"
            }
            GridMode::EditCell(_) => "Enter=apply  Esc=cancel",
            GridMode::Form(_) => "",
        };
        frame.render_widget(Paragraph::new(Span::styled(keys, FOOTER_STYLE)), keys_area);
    }

    pub fn handle_key_event(&mut self, code: KeyCode) -> GridAction {
        match &mut self.mode {
            GridMode::Normal => {}
            GridMode::EditCell(input) => {
                match code {
                    KeyCode::Esc => self.mode = GridMode::Normal,
                    KeyCode::Backspace => {
                        input.pop();
                    }
                    KeyCode::Char(c) => input.push(c),
                    KeyCode::Enter => self.apply_cell_edit(),
                    _ => {}
                }
                return GridAction::Continue;
            }
            GridMode::Form(view) => {
                return match view.handle_key(code) {
                    FormAction::Continue => GridAction::Continue,
                    FormAction::Cancel => {
                        self.mode = GridMode::Normal;
                        GridAction::Continue
                    }
                    FormAction::Submit => GridAction::SubmitForm,
                };
            }
        }

        self.status_message = None;
        let rows = self.grid.working().len();
        let cols = self.grid.working().schema.columns.len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return GridAction::Close,
            KeyCode::Down => {
                if self.selected + 1 < rows {
                    self.selected += 1;
                }
            }
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Right => {
                if self.column + 1 < cols {
                    self.column += 1;
                }
            }
            KeyCode::Left => self.column = self.column.saturating_sub(1),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = rows.saturating_sub(1),
            KeyCode::Char('e') | KeyCode::Enter => {
                if rows == 0 {
                    return GridAction::Continue;
                }
                let column = self.column_name();
                match self.grid.check_editable(column) {
                    Ok(_) => self.mode = GridMode::EditCell(String::new()),
                    Err(e) => self.status_message = Some(Notice::warning(e.to_string())),
                }
            }
            KeyCode::Char('s') => return GridAction::Save,
            KeyCode::Char('r') => return GridAction::Reload,
            KeyCode::Char('n') => return GridAction::OpenForm,
            _ => {}
        }
        GridAction::Continue
    }

    fn apply_cell_edit(&mut self) {
        let GridMode::EditCell(input) = std::mem::replace(&mut self.mode, GridMode::Normal) else {
            return;
        };
        let column = self.column_name();
        if let Err(e) = self.grid.edit_input(self.selected, column, &input) {
            self.status_message = Some(Notice::warning(e.to_string()));
        }
    }

    /// Carry out an action that needs the store. Returns true when the
    /// browser should close.
    pub fn apply<S: RecordStore>(&mut self, action: GridAction, repo: &mut Repository<S>) -> bool {
        match action {
            GridAction::Close => return true,
            GridAction::Continue => {}
            GridAction::Save => {
                let report = self.grid.save(repo);
                self.status_message = Some(if report.no_changes {
                    Notice::info("Nothing to save.")
                } else if report.failures.is_empty() {
                    Notice::success(format!("Saved {} row(s).", report.updated.len()))
                } else {
                    Notice::warning(format!(
                        "Saved {} row(s), {} failed.",
                        report.updated.len(),
                        report.failures.len()
                    ))
                });
                self.clamp_selection();
            }
            GridAction::Reload => {
                self.grid.reload(repo);
                self.clamp_selection();
            }
            GridAction::OpenForm => {
                let kind = match self.grid.table() {
                    TicketTable::Live => FormKind::Live,
                    _ => FormKind::Badging,
                };
                let options = repo.load_directory_options();
                let mut view = FormView::new(TicketForm::new(
                    kind,
                    options.data,
                    Local::now().date_naive(),
                ));
                view.status = options.notices.into_iter().next();
                self.mode = GridMode::Form(view);
            }
            GridAction::SubmitForm => {
                let GridMode::Form(view) = &mut self.mode else {
                    return false;
                };
                match view.form.submit(repo) {
                    Ok(_) => {
                        let message = match view.form.kind() {
                            FormKind::Badging => "New ticket added successfully!",
                            FormKind::Live => {
                                "New live ticket added successfully! Triggers should populate other fields."
                            }
                        };
                        self.mode = GridMode::Normal;
                        self.grid.reload(repo);
                        self.status_message = Some(Notice::success(message));
                    }
                    Err(e) => {
                        view.status = Some(Notice::error(format!("Failed to add new ticket: {e}")));
                    }
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;
    use crate::store::memory::MemoryStore;
    use serde_json::json;

    fn repo() -> Repository<MemoryStore> {
        let store = MemoryStore::new();
        store.seed(
            TicketTable::Badging,
            vec![
                json!({"id": 1, "Date": "2025-01-02", "Tech": "Ana", "Site": "North",
                       "Hours": 2.0, "Additional": 0.0, "Base": 60.0, "Total": 60.0}),
                json!({"id": 2, "Date": "2025-01-05", "Tech": "Ben", "Site": "South",
                       "Hours": 1.0, "Additional": 10.0, "Base": 30.0, "Total": 40.0}),
            ]
            .into_iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect(),
        );
        store.seed(
            TicketTable::Directory,
            vec![json!({"Name": "Ana", "Site": "North", "Badge": "YES"})
                .as_object()
                .unwrap()
                .clone()],
        );
        Repository::new(store)
    }

    fn browser(repo: &mut Repository<MemoryStore>) -> GridBrowser {
        let mut grid = GridController::new(TicketTable::Badging);
        grid.load(repo);
        GridBrowser::new(grid)
    }

    fn type_keys(b: &mut GridBrowser, text: &str) {
        for c in text.chars() {
            b.handle_key_event(KeyCode::Char(c));
        }
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut r = repo();
        let mut b = browser(&mut r);
        for _ in 0..5 {
            b.handle_key_event(KeyCode::Down);
        }
        assert_eq!(b.selected, 1);
        for _ in 0..20 {
            b.handle_key_event(KeyCode::Right);
        }
        assert_eq!(b.column, TicketTable::Badging.schema().columns.len() - 1);
        b.handle_key_event(KeyCode::Home);
        assert_eq!(b.selected, 0);
    }

    #[test]
    fn test_edit_then_save_round() {
        let mut r = repo();
        let mut b = browser(&mut r);
        b.handle_key_event(KeyCode::Down);
        for _ in 0..3 {
            b.handle_key_event(KeyCode::Right);
        }
        b.handle_key_event(KeyCode::Char('e'));
        type_keys(&mut b, "4.5");
        b.handle_key_event(KeyCode::Enter);
        assert_eq!(b.grid().state(), GridState::Dirty);
        assert_eq!(b.grid().diff()[&1]["Hours"], CellValue::Number(4.5));

        let action = b.handle_key_event(KeyCode::Char('s'));
        assert!(!b.apply(action, &mut r));
        assert_eq!(b.grid().state(), GridState::Loaded);
        assert_eq!(
            r.store().rows(TicketTable::Badging)[1]["Hours"],
            json!(4.5)
        );
    }

    #[test]
    fn test_invalid_cell_input_shows_warning() {
        let mut r = repo();
        let mut b = browser(&mut r);
        for _ in 0..3 {
            b.handle_key_event(KeyCode::Right);
        }
        b.handle_key_event(KeyCode::Enter);
        type_keys(&mut b, "lots");
        b.handle_key_event(KeyCode::Enter);
        assert!(b.status_message.is_some());
        assert_eq!(b.grid().state(), GridState::Loaded);
    }

    #[test]
    fn test_new_ticket_form_submits_and_reloads() {
        let mut r = repo();
        let mut b = browser(&mut r);
        let action = b.handle_key_event(KeyCode::Char('n'));
        b.apply(action, &mut r);
        assert!(matches!(b.mode, GridMode::Form(_)));

        let action = b.handle_key_event(KeyCode::Char('s'));
        assert!(matches!(action, GridAction::SubmitForm));
        b.apply(action, &mut r);
        assert!(matches!(b.mode, GridMode::Normal));
        assert_eq!(b.grid().working().len(), 3);
    }

    #[test]
    fn test_q_closes() {
        let mut r = repo();
        let mut b = browser(&mut r);
        let action = b.handle_key_event(KeyCode::Char('q'));
        assert!(b.apply(action, &mut r));
    }
}
