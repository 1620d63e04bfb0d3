use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::Frame;

use crate::error::Result;
use crate::fmt::money;
use crate::repository::{Notice, NoticeLevel};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_POS_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const AMOUNT_NEG_STYLE: Style = Style::new().fg(Color::Red);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

/// Cell under the cursor inside the selected row.
pub const CURSOR_STYLE: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::Yellow);

/// Edited but unsaved cells.
pub const DIRTY_STYLE: Style = Style::new().fg(Color::Cyan);

pub const READ_ONLY_STYLE: Style = Style::new().fg(Color::DarkGray);

/// Signed amount as a colored span. P&L can go negative, so the sign stays.
pub fn money_span(amount: f64) -> Span<'static> {
    let style = if amount < 0.0 {
        AMOUNT_NEG_STYLE
    } else {
        AMOUNT_POS_STYLE
    };
    Span::styled(money(amount), style)
}

pub fn notice_style(level: NoticeLevel) -> Style {
    match level {
        NoticeLevel::Info => Style::new().fg(Color::Cyan),
        NoticeLevel::Success => Style::new().fg(Color::Green),
        NoticeLevel::Warning => Style::new().fg(Color::Yellow),
        NoticeLevel::Error => Style::new().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

pub fn notice_line(notice: &Notice) -> Line<'static> {
    Line::from(Span::styled(
        format!(" {}", notice.message),
        notice_style(notice.level),
    ))
}

pub enum ReportViewAction {
    Continue,
    Close,
    /// Drop cached reads and rebuild the view. `run_report_view` ignores it.
    Reload,
}

pub trait ReportView {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> ReportViewAction;
}

/// Run an interactive ratatui report view. Sets up the terminal, event loop,
/// and panic hook, then restores the terminal on exit.
pub fn run_report_view(view: &mut dyn ReportView) -> Result<()> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();

    let result: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| view.draw(frame)) {
            break Err(e.into());
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    break Ok(());
                }
                match view.handle_key(key.code) {
                    ReportViewAction::Close => break Ok(()),
                    ReportViewAction::Continue | ReportViewAction::Reload => {}
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    result
}
