use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use super::{PnlPage, ReportingPage};
use crate::fmt::{month_label, money, pct};
use crate::repository::Notice;
use crate::tui::{
    money_span, notice_line, ReportView, ReportViewAction, AMOUNT_NEG_STYLE, AMOUNT_POS_STYLE,
    FOOTER_STYLE, HEADER_STYLE,
};

const BOLD: Style = Style::new().add_modifier(Modifier::BOLD);
const SECTION_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

fn text_cell(s: impl Into<String>) -> Cell<'static> {
    Cell::from(s.into())
}

fn section_row(label: &str) -> Row<'static> {
    Row::new(vec![
        Cell::from(Span::styled(label.to_string(), SECTION_STYLE)),
        Cell::from(""),
        Cell::from(""),
    ])
}

fn blank_row() -> Row<'static> {
    Row::new(vec![Cell::from(""); 3])
}

// ---------------------------------------------------------------------------
// Scrolling three-column body shared by both report pages
// ---------------------------------------------------------------------------

struct ReportBody {
    rows: Vec<Row<'static>>,
    offset: usize,
    visible_count: usize,
}

impl ReportBody {
    fn new(rows: Vec<Row<'static>>) -> Self {
        Self {
            rows,
            offset: 0,
            visible_count: 20,
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) {
        self.visible_count = (area.height as usize).max(1);
        let visible: Vec<Row> = self
            .rows
            .iter()
            .skip(self.offset)
            .take(self.visible_count)
            .cloned()
            .collect();
        let widths = [Constraint::Fill(1), Constraint::Length(16), Constraint::Length(16)];
        frame.render_widget(Table::new(visible, widths).column_spacing(2), area);
    }

    /// Returns true when the key scrolled the body.
    fn scroll(&mut self, code: KeyCode) -> bool {
        let max = self.rows.len().saturating_sub(self.visible_count);
        match code {
            KeyCode::Up | KeyCode::Char('k') => self.offset = self.offset.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.offset = (self.offset + 1).min(max),
            KeyCode::PageUp => self.offset = self.offset.saturating_sub(self.visible_count),
            KeyCode::PageDown => self.offset = (self.offset + self.visible_count).min(max),
            KeyCode::Home => self.offset = 0,
            KeyCode::End => self.offset = max,
            _ => return false,
        }
        true
    }
}

fn draw_chrome(frame: &mut Frame, title: &str, footer: &str) -> Rect {
    let area = frame.area();
    let [header_area, sep_area, content_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);
    frame.render_widget(Paragraph::new(format!(" {title}")).style(HEADER_STYLE), header_area);
    frame.render_widget(
        Paragraph::new("\u{2501}".repeat(area.width as usize)).style(FOOTER_STYLE),
        sep_area,
    );
    frame.render_widget(Paragraph::new(format!(" {footer}")).style(FOOTER_STYLE), footer_area);
    content_area
}

/// Splits off a notice strip at the top of `area` when there is anything to show.
fn draw_notices(frame: &mut Frame, area: Rect, notices: &[Notice]) -> Rect {
    if notices.is_empty() {
        return area;
    }
    let height = (notices.len() as u16 + 1).min(area.height / 2);
    let [top, rest] =
        Layout::vertical([Constraint::Length(height), Constraint::Fill(1)]).areas(area);
    let lines: Vec<Line> = notices.iter().map(notice_line).collect();
    frame.render_widget(Paragraph::new(lines), top);
    rest
}

fn key_action(body: &mut ReportBody, code: KeyCode) -> ReportViewAction {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => ReportViewAction::Close,
        KeyCode::Char('r') => ReportViewAction::Reload,
        other => {
            body.scroll(other);
            ReportViewAction::Continue
        }
    }
}

// ---------------------------------------------------------------------------
// Reporting Page
// ---------------------------------------------------------------------------

pub struct ReportingView {
    page: ReportingPage,
    body: ReportBody,
}

impl ReportingView {
    pub fn new(page: ReportingPage) -> Self {
        let body = ReportBody::new(reporting_rows(&page));
        Self { page, body }
    }

    #[cfg(test)]
    pub fn page(&self) -> &ReportingPage {
        &self.page
    }
}

fn reporting_rows(page: &ReportingPage) -> Vec<Row<'static>> {
    let a = &page.allocation;
    let mut rows = vec![section_row("BUDGET ALLOCATION")];
    for s in &a.slices {
        rows.push(Row::new([
            text_cell(format!("  {}", s.label)),
            Cell::from(money_span(s.amount)),
            text_cell(pct(s.percent, 1)),
        ]));
    }
    rows.push(Row::new([
        Cell::from(Span::styled("  Budget", BOLD)),
        text_cell(money(a.budget)),
        text_cell(""),
    ]));
    if a.overage {
        rows.push(Row::new([
            Cell::from(Span::styled("  Over budget", AMOUNT_NEG_STYLE)),
            Cell::from(money_span(a.budget - a.paid)),
            text_cell(""),
        ]));
    }
    rows.push(blank_row());

    rows.push(section_row("BADGING BY SITE"));
    rows.push(Row::new([text_cell("  Site"), text_cell("Badged"), text_cell("Not Badged")]).style(FOOTER_STYLE));
    for s in &page.sites {
        rows.push(Row::new([
            text_cell(format!("  {} ({})", s.site, s.total)),
            text_cell(format!("{} {}", s.badged_fraction, pct(s.badged_pct, 2))),
            text_cell(format!("{} {}", s.not_badged_fraction, pct(s.not_badged_pct, 2))),
        ]));
    }
    if page.sites.is_empty() {
        rows.push(Row::new([text_cell("  No badging data"), text_cell(""), text_cell("")]));
    }
    rows.push(blank_row());

    let st = &page.statistics;
    rows.push(section_row("STATISTICS"));
    let live = if st.live_sites.is_empty() {
        "none".to_string()
    } else {
        st.live_sites.join(", ")
    };
    for (label, value) in [
        ("  Live sites (>65%)", live),
        ("  Badged technicians", st.badged_techs.to_string()),
        ("  Pending technicians", st.pending_techs.to_string()),
        (
            "  Overall badged",
            st.percent_badged.map(|p| pct(p, 1)).unwrap_or_else(|| "n/a".into()),
        ),
    ] {
        rows.push(Row::new([text_cell(label), text_cell(value), text_cell("")]));
    }
    rows
}

impl ReportView for ReportingView {
    fn draw(&mut self, frame: &mut Frame) {
        let content = draw_chrome(
            frame,
            "Reporting Page",
            "\u{2191}/\u{2193}=scroll  r=reload  q/Esc=close",
        );
        let content = draw_notices(frame, content, &self.page.notices);
        let [left, right] =
            Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(content);
        self.body.draw(frame, left);

        let groups: Vec<BarGroup> = self
            .page
            .chart
            .iter()
            .map(|b| {
                BarGroup::default()
                    .label(Line::from(b.site.clone()))
                    .bars(&[
                        Bar::default().value(b.badged as u64).style(AMOUNT_POS_STYLE),
                        Bar::default().value(b.not_badged as u64).style(AMOUNT_NEG_STYLE),
                    ])
            })
            .collect();
        let mut chart = BarChart::default()
            .block(
                Block::default()
                    .borders(Borders::LEFT)
                    .title(Span::styled(" Badged / Not Badged ", BOLD)),
            )
            .bar_width(3)
            .bar_gap(0)
            .group_gap(2);
        for g in groups {
            chart = chart.data(g);
        }
        frame.render_widget(chart, right);
    }

    fn handle_key(&mut self, code: KeyCode) -> ReportViewAction {
        key_action(&mut self.body, code)
    }
}

// ---------------------------------------------------------------------------
// PNL Report
// ---------------------------------------------------------------------------

pub struct PnlView {
    page: PnlPage,
    body: ReportBody,
}

impl PnlView {
    pub fn new(page: PnlPage) -> Self {
        let body = ReportBody::new(pnl_rows(&page));
        Self { page, body }
    }

    #[cfg(test)]
    pub fn page(&self) -> &PnlPage {
        &self.page
    }

    fn step(&mut self, delta: isize) {
        self.page.step_month(delta);
        self.body = ReportBody::new(pnl_rows(&self.page));
    }
}

fn pnl_rows(page: &PnlPage) -> Vec<Row<'static>> {
    let mut rows = vec![section_row("SLA COUNTS")];
    for (sla, n) in &page.sla.known {
        rows.push(Row::new([text_cell(format!("  {}", sla.label())), text_cell(n.to_string()), text_cell("")]));
    }
    rows.push(Row::new([text_cell("  Other"), text_cell(page.sla.other.to_string()), text_cell("")]));
    rows.push(Row::new([
        Cell::from(Span::styled("  Total dispatches", BOLD)),
        text_cell(page.sla.total.to_string()),
        text_cell(""),
    ]));
    for t in &page.sla.other_rows {
        rows.push(
            Row::new([
                text_cell(format!(
                    "    #{} {} {}",
                    t.id.map(|i| i.to_string()).unwrap_or_default(),
                    t.tech,
                    t.site
                )),
                text_cell(t.sla.clone()),
                text_cell(t.date.map(|d| d.to_string()).unwrap_or_default()),
            ])
            .style(FOOTER_STYLE),
        );
    }
    rows.push(blank_row());

    let Some(r) = page.rollup() else {
        rows.push(Row::new([text_cell("  No dated dispatches"), text_cell(""), text_cell("")]));
        return rows;
    };
    rows.push(section_row(&format!("FINANCIALS \u{2014} {}", month_label(&r.month))));
    rows.push(Row::new([text_cell(""), text_cell("Total"), text_cell("Per Ticket")]).style(FOOTER_STYLE));
    for (label, total, avg) in [
        ("  FN Pay", r.total_fn_pay, r.avg_fn_pay),
        ("  DXC Pay", r.total_dxc_pay, r.avg_dxc_pay),
        ("  PNL", r.total_pnl, r.avg_pnl),
    ] {
        rows.push(Row::new([text_cell(label), Cell::from(money_span(total)), Cell::from(money_span(avg))]));
    }
    rows.push(Row::new([text_cell("  Tickets"), text_cell(r.tickets.to_string()), text_cell("")]));
    for (heading, counts) in [("BY SLA", &r.by_sla), ("BY SITE", &r.by_site)] {
        rows.push(blank_row());
        rows.push(section_row(heading));
        for (k, n) in counts {
            let label = if k.is_empty() { "(blank)" } else { k.as_str() };
            rows.push(Row::new([text_cell(format!("  {label}")), text_cell(n.to_string()), text_cell("")]));
        }
    }
    rows
}

impl ReportView for PnlView {
    fn draw(&mut self, frame: &mut Frame) {
        let title = match self.page.month() {
            Some(m) => format!("PNL Report \u{2014} {}", month_label(m)),
            None => "PNL Report".to_string(),
        };
        let content = draw_chrome(
            frame,
            &title,
            "\u{2190}/\u{2192}=month  \u{2191}/\u{2193}=scroll  r=reload  q/Esc=close",
        );
        let content = draw_notices(frame, content, &self.page.notices);
        self.body.draw(frame, content);
    }

    fn handle_key(&mut self, code: KeyCode) -> ReportViewAction {
        match code {
            // Months are listed newest first, so Left steps back in time.
            KeyCode::Left => {
                self.step(1);
                ReportViewAction::Continue
            }
            KeyCode::Right => {
                self.step(-1);
                ReportViewAction::Continue
            }
            other => key_action(&mut self.body, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRow;
    use crate::repository::Repository;
    use crate::schema::TicketTable;
    use crate::store::memory::MemoryStore;
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    fn raw(v: serde_json::Value) -> RawRow {
        v.as_object().unwrap().clone()
    }

    fn pnl_view() -> PnlView {
        let store = MemoryStore::new();
        store.seed(
            TicketTable::Live,
            vec![
                raw(json!({"id": 1, "Date": "2025-01-15", "SLA": "2 Hour", "PNL": 10.0})),
                raw(json!({"id": 2, "Date": "2025-02-15", "SLA": "4 Hour", "PNL": -4.0})),
            ],
        );
        let mut repo = Repository::new(store);
        PnlView::new(PnlPage::load(&mut repo))
    }

    #[test]
    fn test_pnl_view_arrow_keys_change_month() {
        let mut v = pnl_view();
        assert_eq!(v.page().month(), Some("2025-02"));
        assert!(matches!(v.handle_key(KeyCode::Left), ReportViewAction::Continue));
        assert_eq!(v.page().month(), Some("2025-01"));
        v.handle_key(KeyCode::Right);
        assert_eq!(v.page().month(), Some("2025-02"));
        assert!(matches!(v.handle_key(KeyCode::Char('r')), ReportViewAction::Reload));
        assert!(matches!(v.handle_key(KeyCode::Esc), ReportViewAction::Close));
    }

    #[test]
    fn test_views_render_without_panicking() {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let mut v = pnl_view();
        terminal.draw(|f| v.draw(f)).unwrap();

        let store = MemoryStore::new();
        store.seed(
            TicketTable::Directory,
            vec![raw(json!({"Name": "Ana", "Site": "North", "Badge": "YES"}))],
        );
        let mut repo = Repository::new(store);
        let mut r = ReportingView::new(ReportingPage::load(&mut repo, 35000.0));
        terminal.draw(|f| r.draw(f)).unwrap();
        assert_eq!(r.page().statistics.badged_techs, 1);
    }
}
