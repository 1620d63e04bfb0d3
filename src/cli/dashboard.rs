use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::report::view::{PnlView, ReportingView};
use super::report::{PnlPage, ReportingPage};
use crate::browser::GridBrowser;
use crate::error::Result;
use crate::grid::{GridController, GridState};
use crate::repository::{Notice, Repository};
use crate::schema::TicketTable;
use crate::settings::{load_settings, Settings};
use crate::store::RecordStore;
use crate::tui::{notice_line, run_report_view, ReportView, ReportViewAction, FOOTER_STYLE, HEADER_STYLE};

/// The dashboard's views, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    BadgingTickets,
    LiveDispatches,
    ReportingPage,
    PnlReport,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Home,
        Page::BadgingTickets,
        Page::LiveDispatches,
        Page::ReportingPage,
        Page::PnlReport,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::BadgingTickets => "Badging Tickets",
            Page::LiveDispatches => "Live Dispatches",
            Page::ReportingPage => "Reporting Page",
            Page::PnlReport => "PNL Report",
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            Page::Home => "This overview.",
            Page::BadgingTickets => "View, edit and add badging dispatch tickets.",
            Page::LiveDispatches => {
                "View, edit and add live dispatches. Pay and PNL columns are filled in by the store."
            }
            Page::ReportingPage => "Budget allocation and badging progress by site.",
            Page::PnlReport => "SLA counts and monthly FN pay, DXC pay and PNL.",
        }
    }
}

/// Home page as plain text, for runs without a terminal.
pub fn home_text(settings: &Settings) -> String {
    let mut out = format!("{}\n\n", settings.title);
    for (i, page) in Page::ALL.iter().enumerate().skip(1) {
        out.push_str(&format!("{i}. {:<16} {}\n", page.title(), page.summary()));
    }
    out.push_str("\nRun `dispatch-desk --help` for the command-line equivalents.");
    out
}

enum Screen {
    Home,
    Grid(GridBrowser),
    Reporting(ReportingView),
    Pnl(PnlView),
}

pub struct Dashboard<S: RecordStore> {
    repo: Repository<S>,
    settings: Settings,
    screen: Screen,
    menu_selection: usize,
    status_message: Option<Notice>,
}

impl<S: RecordStore> Dashboard<S> {
    pub fn new(repo: Repository<S>, settings: Settings) -> Self {
        Self {
            repo,
            settings,
            screen: Screen::Home,
            menu_selection: 0,
            status_message: None,
        }
    }

    pub fn page(&self) -> Page {
        match &self.screen {
            Screen::Home => Page::Home,
            Screen::Grid(b) if b.grid().table() == TicketTable::Live => Page::LiveDispatches,
            Screen::Grid(_) => Page::BadgingTickets,
            Screen::Reporting(_) => Page::ReportingPage,
            Screen::Pnl(_) => Page::PnlReport,
        }
    }

    /// Switch to `page`, loading its data fresh from the cache or store.
    pub fn open(&mut self, page: Page) {
        self.status_message = None;
        self.screen = match page {
            Page::Home => Screen::Home,
            Page::BadgingTickets | Page::LiveDispatches => {
                let table = if page == Page::LiveDispatches {
                    TicketTable::Live
                } else {
                    TicketTable::Badging
                };
                let mut grid = GridController::new(table);
                grid.load(&mut self.repo);
                Screen::Grid(GridBrowser::new(grid))
            }
            Page::ReportingPage => Screen::Reporting(ReportingView::new(ReportingPage::load(
                &mut self.repo,
                self.settings.startup_budget,
            ))),
            Page::PnlReport => Screen::Pnl(PnlView::new(PnlPage::load(&mut self.repo))),
        };
    }

    fn draw_screen(&mut self, frame: &mut Frame) {
        match &mut self.screen {
            Screen::Grid(browser) => browser.draw_frame(frame),
            Screen::Reporting(view) => view.draw(frame),
            Screen::Pnl(view) => view.draw(frame),
            Screen::Home => {}
        }
        if matches!(self.screen, Screen::Home) {
            self.draw_home(frame);
        }
    }

    fn draw_home(&self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, sep_area, content_area, status_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(
            Paragraph::new(format!(" {}", self.settings.title)).style(HEADER_STYLE),
            header_area,
        );
        frame.render_widget(
            Paragraph::new("\u{2501}".repeat(area.width as usize)).style(FOOTER_STYLE),
            sep_area,
        );

        let mut lines = vec![
            Line::from(" Track badging and live dispatch tickets and review budget and PNL reports."),
            Line::from(""),
        ];
        for (i, page) in Page::ALL.iter().enumerate().skip(1) {
            let selected = i - 1 == self.menu_selection;
            let marker = if selected { ">" } else { " " };
            let style = if selected {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(vec![
                Span::styled(format!(" {marker} {i}. {:<16}", page.title()), style),
                Span::styled(page.summary(), FOOTER_STYLE),
            ]));
        }
        frame.render_widget(Paragraph::new(lines), content_area);

        if let Some(n) = &self.status_message {
            frame.render_widget(Paragraph::new(notice_line(n)), status_area);
        }
        frame.render_widget(
            Paragraph::new(" \u{2191}/\u{2193}=navigate  Enter/1-4=open  q=quit").style(FOOTER_STYLE),
            hints_area,
        );
    }

    /// Returns true when the dashboard should quit.
    fn handle_home_key(&mut self, code: KeyCode) -> bool {
        self.status_message = None;
        let items = Page::ALL.len() - 1;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => self.menu_selection = self.menu_selection.saturating_sub(1),
            KeyCode::Down => self.menu_selection = (self.menu_selection + 1).min(items - 1),
            KeyCode::Enter => self.open(Page::ALL[self.menu_selection + 1]),
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '0' as usize;
                self.menu_selection = idx - 1;
                self.open(Page::ALL[idx]);
            }
            _ => {}
        }
        false
    }

    /// Route one key press. Returns true when the dashboard should quit.
    pub fn route_key(&mut self, code: KeyCode) -> bool {
        if matches!(self.screen, Screen::Home) {
            return self.handle_home_key(code);
        }
        let mut return_home = false;
        match &mut self.screen {
            Screen::Home => {}
            Screen::Grid(browser) => {
                let action = browser.handle_key_event(code);
                return_home = browser.apply(action, &mut self.repo);
                if return_home && matches!(browser.grid().state(), GridState::Dirty | GridState::Error) {
                    self.status_message = Some(Notice::warning(format!(
                        "Unsaved edits in {} were discarded.",
                        browser.grid().table().name()
                    )));
                }
            }
            Screen::Reporting(view) => match view.handle_key(code) {
                ReportViewAction::Close => return_home = true,
                ReportViewAction::Continue => {}
                ReportViewAction::Reload => {
                    *view = ReportingView::new(ReportingPage::reload(
                        &mut self.repo,
                        self.settings.startup_budget,
                    ));
                }
            },
            Screen::Pnl(view) => match view.handle_key(code) {
                ReportViewAction::Close => return_home = true,
                ReportViewAction::Continue => {}
                ReportViewAction::Reload => {
                    *view = PnlView::new(PnlPage::reload(&mut self.repo));
                }
            },
        }
        if return_home {
            self.screen = Screen::Home;
        }
        false
    }
}

impl<S: RecordStore> ReportView for Dashboard<S> {
    fn draw(&mut self, frame: &mut Frame) {
        self.draw_screen(frame);
    }

    fn handle_key(&mut self, code: KeyCode) -> ReportViewAction {
        if self.route_key(code) {
            ReportViewAction::Close
        } else {
            ReportViewAction::Continue
        }
    }
}

pub fn run_with<S: RecordStore>(repo: Repository<S>, settings: Settings) -> Result<()> {
    run_report_view(&mut Dashboard::new(repo, settings))
}

pub fn run() -> Result<()> {
    let settings = load_settings();
    let repo = super::connect(&settings)?;
    run_with(repo, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    fn dashboard() -> Dashboard<MemoryStore> {
        let store = MemoryStore::new();
        store.seed(
            TicketTable::Badging,
            vec![json!({"id": 1, "Date": "2025-01-02", "Tech": "Ana", "Total": 10.0})
                .as_object()
                .unwrap()
                .clone()],
        );
        Dashboard::new(Repository::new(store), Settings::default())
    }

    #[test]
    fn test_home_text_lists_pages_in_order() {
        let text = home_text(&Settings::default());
        assert!(text.starts_with("DXC-HPI Reporting Tool"));
        let positions: Vec<usize> = Page::ALL[1..]
            .iter()
            .map(|p| text.find(p.title()).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_menu_navigation_opens_pages() {
        let mut d = dashboard();
        assert_eq!(d.page(), Page::Home);
        d.route_key(KeyCode::Down);
        d.route_key(KeyCode::Enter);
        assert_eq!(d.page(), Page::LiveDispatches);
        d.route_key(KeyCode::Char('q'));
        assert_eq!(d.page(), Page::Home);
        d.route_key(KeyCode::Char('4'));
        assert_eq!(d.page(), Page::PnlReport);
        d.route_key(KeyCode::Esc);
        d.route_key(KeyCode::Char('3'));
        assert_eq!(d.page(), Page::ReportingPage);
        d.route_key(KeyCode::Char('r'));
        assert_eq!(d.page(), Page::ReportingPage);
        d.route_key(KeyCode::Esc);
        assert!(d.route_key(KeyCode::Char('q')));
    }

    #[test]
    fn test_every_page_draws() {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        let mut d = dashboard();
        for page in Page::ALL {
            d.open(page);
            terminal.draw(|f| d.draw_screen(f)).unwrap();
        }
    }

    #[test]
    fn test_pages_share_the_session_cache() {
        let mut d = dashboard();
        d.open(Page::BadgingTickets);
        d.open(Page::Home);
        d.open(Page::BadgingTickets);
        assert_eq!(d.repo.store().select_calls(), 1);
    }
}
