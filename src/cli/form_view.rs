use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::form::{FieldInput, TicketForm};
use crate::fmt::money;
use crate::repository::Notice;
use crate::tui::{notice_line, FOOTER_STYLE, HEADER_STYLE};

pub enum FormAction {
    Continue,
    Cancel,
    Submit,
}

/// Keyboard front end for a [`TicketForm`].
pub struct FormView {
    pub form: TicketForm,
    selected: usize,
    /// Text being typed into the selected date/amount field.
    input: Option<String>,
    pub status: Option<Notice>,
}

impl FormView {
    pub fn new(form: TicketForm) -> Self {
        Self {
            form,
            selected: 0,
            input: None,
            status: None,
        }
    }

    pub fn height(&self) -> u16 {
        self.form.fields().len() as u16 + 5
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let mut lines = Vec::new();
        for (i, field) in self.form.fields().iter().enumerate() {
            let marker = if i == self.selected { ">" } else { " " };
            let value = match (&self.input, i == self.selected) {
                (Some(text), true) => format!("{text}\u{2588}"),
                _ => match &field.input {
                    FieldInput::Choice { .. } => {
                        let v = field.display();
                        format!("\u{2039} {} \u{203a}", if v.is_empty() { "(none)" } else { v.as_str() })
                    }
                    _ => field.display(),
                },
            };
            let style = if i == self.selected {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(
                format!(" {marker} {:<16} {value}", field.label),
                style,
            )));
        }
        if let Some(total) = self.form.total() {
            lines.push(Line::from(format!("   {:<16} {}", "Total ($)", money(total))));
        }
        match &self.status {
            Some(n) => lines.push(notice_line(n)),
            None => lines.push(Line::from("")),
        }
        lines.push(Line::from(Span::styled(
            " \u{2191}/\u{2193}:field  \u{2190}/\u{2192}:choose  Enter:type  s:submit  Esc:cancel",
            FOOTER_STYLE,
        )));

        let block = Block::default()
            .borders(Borders::TOP)
            .title(Span::styled(format!(" {} ", self.form.kind().title()), HEADER_STYLE));
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    pub fn handle_key(&mut self, code: KeyCode) -> FormAction {
        if let Some(text) = &mut self.input {
            match code {
                KeyCode::Esc => self.input = None,
                KeyCode::Backspace => {
                    text.pop();
                }
                KeyCode::Char(c) => text.push(c),
                KeyCode::Enter => self.commit_input(),
                _ => {}
            }
            return FormAction::Continue;
        }

        let count = self.form.fields().len();
        match code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Char('s') => return FormAction::Submit,
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Tab => {
                if self.selected + 1 < count {
                    self.selected += 1;
                }
            }
            KeyCode::Left | KeyCode::Right => {
                if let Some(field) = self.form.field_mut(self.selected) {
                    field.cycle(code == KeyCode::Right);
                }
            }
            KeyCode::Enter => {
                if let Some(field) = self.form.fields().get(self.selected) {
                    if !matches!(field.input, FieldInput::Choice { .. }) {
                        self.input = Some(String::new());
                    }
                }
            }
            _ => {}
        }
        FormAction::Continue
    }

    fn commit_input(&mut self) {
        let Some(text) = self.input.take() else {
            return;
        };
        if let Some(field) = self.form.field_mut(self.selected) {
            self.status = match field.set_text(&text) {
                Ok(()) => None,
                Err(e) => Some(Notice::warning(e.to_string())),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormKind;
    use crate::repository::DirectoryOptions;
    use chrono::NaiveDate;

    fn view() -> FormView {
        let options = DirectoryOptions {
            techs: vec!["Amy".into()],
            sites: vec!["North".into()],
        };
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        FormView::new(TicketForm::new(FormKind::Badging, options, today))
    }

    fn type_text(view: &mut FormView, text: &str) {
        view.handle_key(KeyCode::Enter);
        for c in text.chars() {
            view.handle_key(KeyCode::Char(c));
        }
        view.handle_key(KeyCode::Enter);
    }

    #[test]
    fn test_typing_amounts_updates_total() {
        let mut v = view();
        for _ in 0..4 {
            v.handle_key(KeyCode::Down);
        }
        type_text(&mut v, "100");
        v.handle_key(KeyCode::Down);
        type_text(&mut v, "25");
        assert_eq!(v.form.total(), Some(125.0));
        assert!(v.status.is_none());
    }

    #[test]
    fn test_bad_input_leaves_warning() {
        let mut v = view();
        v.handle_key(KeyCode::Down);
        v.handle_key(KeyCode::Down);
        v.handle_key(KeyCode::Down);
        type_text(&mut v, "-3");
        assert!(v.status.is_some());
        assert_eq!(v.form.fields()[3].display(), "0.00");
    }

    #[test]
    fn test_arrows_cycle_choices_and_s_submits() {
        let mut v = view();
        v.handle_key(KeyCode::Down);
        v.handle_key(KeyCode::Right);
        assert_eq!(v.form.fields()[1].display(), "Amy");
        assert!(matches!(v.handle_key(KeyCode::Char('s')), FormAction::Submit));
        assert!(matches!(v.handle_key(KeyCode::Esc), FormAction::Cancel));
    }
}
