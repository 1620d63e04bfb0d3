pub mod text;
pub mod view;

use std::io::IsTerminal;

use chrono::NaiveDate;

use crate::error::{DeskError, Result};
use crate::models::{DirectoryEntry, LiveDispatchTicket};
use crate::reports::{
    self, BadgingBar, BadgingStatistics, BudgetAllocation, MonthlyLedger, MonthlyRollup, SiteBadging,
    SlaCounts,
};
use crate::repository::{Notice, Repository};
use crate::schema::TicketTable;
use crate::settings::Settings;
use crate::store::RecordStore;
use crate::tui::run_report_view;

/// Everything the Reporting Page shows, computed from one pair of reads.
pub struct ReportingPage {
    pub allocation: BudgetAllocation,
    pub sites: Vec<SiteBadging>,
    pub statistics: BadgingStatistics,
    pub chart: Vec<BadgingBar>,
    pub notices: Vec<Notice>,
}

impl ReportingPage {
    pub fn load<S: RecordStore>(repo: &mut Repository<S>, budget: f64) -> Self {
        let totals = repo.load_budget_totals();
        let badges = repo.load_directory_badges();
        let mut notices = totals.notices;
        notices.extend(badges.notices);
        Self::build(&totals.data, &badges.data, budget, notices)
    }

    fn build(totals: &[f64], entries: &[DirectoryEntry], budget: f64, notices: Vec<Notice>) -> Self {
        let sites = reports::badging_by_site(entries);
        Self {
            allocation: reports::budget_allocation(totals, budget),
            statistics: reports::badging_statistics(entries, &sites),
            chart: reports::badging_chart(&sites),
            sites,
            notices,
        }
    }

    pub fn reload<S: RecordStore>(repo: &mut Repository<S>, budget: f64) -> Self {
        repo.invalidate(TicketTable::Badging);
        repo.invalidate(TicketTable::Directory);
        Self::load(repo, budget)
    }
}

/// PNL report state: the cleaned live dispatches and the month being viewed.
pub struct PnlPage {
    pub tickets: Vec<LiveDispatchTicket>,
    pub sla: SlaCounts,
    pub notices: Vec<Notice>,
    months: Vec<String>,
    month: Option<String>,
}

impl PnlPage {
    pub fn load<S: RecordStore>(repo: &mut Repository<S>) -> Self {
        let loaded = repo.load_pnl_tickets();
        Self::build(loaded.data, loaded.notices)
    }

    pub fn reload<S: RecordStore>(repo: &mut Repository<S>) -> Self {
        repo.invalidate(TicketTable::Live);
        Self::load(repo)
    }

    fn build(tickets: Vec<LiveDispatchTicket>, notices: Vec<Notice>) -> Self {
        let sla = reports::sla_counts(&tickets);
        let ledger = MonthlyLedger::new(&tickets);
        let months: Vec<String> = ledger.months().into_iter().map(str::to_string).collect();
        let month = months.first().cloned();
        Self {
            tickets,
            sla,
            notices,
            months,
            month,
        }
    }

    /// Newest first.
    pub fn months(&self) -> &[String] {
        &self.months
    }

    pub fn month(&self) -> Option<&str> {
        self.month.as_deref()
    }

    /// Select a month by `YYYY-MM`. Months with no tickets are accepted and
    /// report zeros.
    pub fn select_month(&mut self, month: &str) -> Result<()> {
        validate_month(month)?;
        if !self.months.iter().any(|m| m == month) {
            self.notices
                .push(Notice::info(format!("No live dispatches recorded for {month}.")));
        }
        self.month = Some(month.to_string());
        Ok(())
    }

    /// Step through the listed months; positive `delta` goes back in time.
    pub fn step_month(&mut self, delta: isize) {
        if self.months.is_empty() {
            return;
        }
        let current = self
            .month
            .as_ref()
            .and_then(|m| self.months.iter().position(|x| x == m))
            .unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, self.months.len() as isize - 1) as usize;
        self.month = Some(self.months[next].clone());
    }

    pub fn rollup(&self) -> Option<MonthlyRollup> {
        let month = self.month.as_deref()?;
        Some(MonthlyLedger::new(&self.tickets).rollup(month))
    }
}

fn validate_month(month: &str) -> Result<()> {
    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| DeskError::InvalidInput(format!("month must be YYYY-MM, got '{month}'")))
}

pub fn run_reporting<S: RecordStore>(repo: &mut Repository<S>, settings: &Settings) -> Result<()> {
    let page = ReportingPage::load(repo, settings.startup_budget);
    if std::io::stdout().is_terminal() {
        let mut v = view::ReportingView::new(page);
        run_report_view(&mut v)
    } else {
        println!("{}", text::reporting(&page, &settings.title));
        Ok(())
    }
}

pub fn run_pnl<S: RecordStore>(repo: &mut Repository<S>, month: Option<&str>) -> Result<()> {
    let mut page = PnlPage::load(repo);
    if let Some(m) = month {
        page.select_month(m)?;
    }
    if std::io::stdout().is_terminal() {
        let mut v = view::PnlView::new(page);
        run_report_view(&mut v)
    } else {
        println!("{}", text::pnl(&page));
        Ok(())
    }
}
