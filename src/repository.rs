//! Cached reads and echo-checked writes over a [`RecordStore`].
//!
//! Load paths never fail: transport and store errors come back as an empty
//! result plus an error [`Notice`], so a view can always render something.

use std::collections::BTreeSet;
use std::time::Instant;

use tracing::{info, warn};

use crate::cache::{CacheKey, QueryCache};
use crate::error::{DeskError, Result};
use crate::models::{DirectoryEntry, LiveDispatchTicket, RawRow, Table};
use crate::normalize::{self, DatePolicy};
use crate::schema::{TicketTable, DATE_COLUMN};
use crate::store::{RecordStore, SelectQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

impl From<&DeskError> for Notice {
    fn from(err: &DeskError) -> Self {
        match err {
            DeskError::SchemaMismatch(_) => Notice::warning(err.to_string()),
            _ => Notice::error(err.to_string()),
        }
    }
}

/// Data for a view plus whatever the operator should be told about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub data: T,
    pub notices: Vec<Notice>,
}

impl<T> Loaded<T> {
    pub(crate) fn new(data: T, notices: Vec<Notice>) -> Self {
        Self { data, notices }
    }

    #[cfg(test)]
    pub fn has_errors(&self) -> bool {
        self.notices.iter().any(|n| n.level == NoticeLevel::Error)
    }
}

/// Dropdown choices for the new-ticket forms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryOptions {
    pub techs: Vec<String>,
    pub sites: Vec<String>,
}

const OPTION_COLUMNS: &[&str] = &["Name", "Site"];
const BADGE_COLUMNS: &[&str] = &["Name", "Site", "Badge"];
const BUDGET_COLUMNS: &[&str] = &["Total"];
const FINANCIAL_COLUMNS: &[&str] = &["Total FN Pay", "Total DXC Pay", "PNL"];

pub struct Repository<S: RecordStore> {
    store: S,
    cache: QueryCache,
}

impl<S: RecordStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: QueryCache::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn fetch(&mut self, key: CacheKey, query: SelectQuery) -> Result<Vec<RawRow>> {
        let now = Instant::now();
        if let Some(rows) = self.cache.get(key, now) {
            return Ok(rows.to_vec());
        }
        let rows = self.store.select(&query)?;
        info!(target: "desk::store", table = query.table.name(), rows = rows.len(), "loaded");
        self.cache.put(key, rows.clone(), now);
        Ok(rows)
    }

    fn load_table(&mut self, key: CacheKey, table: TicketTable) -> Loaded<Table> {
        let schema = table.schema();
        let query = SelectQuery::all(table).order_by(DATE_COLUMN);
        let raw = match self.fetch(key, query) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(target: "desk::store", table = table.name(), error = %e, "load failed");
                return Loaded::new(
                    Table::empty(schema),
                    vec![
                        Notice::error(format!("Error loading data from the store: {e}")),
                        Notice::warning("Displaying an empty table due to loading error."),
                    ],
                );
            }
        };
        if raw.is_empty() {
            return Loaded::new(
                Table::empty(schema),
                vec![Notice::info(format!(
                    "No data found in '{}' table. Starting with an empty table.",
                    table.name()
                ))],
            );
        }
        let data = normalize::normalize(&raw, schema, DatePolicy::Lenient);
        let notices = data
            .missing_columns
            .iter()
            .map(|c| Notice::from(&DeskError::SchemaMismatch(c.to_string())))
            .collect();
        Loaded::new(data, notices)
    }

    pub fn load_badging(&mut self) -> Loaded<Table> {
        self.load_table(CacheKey::BadgingTickets, TicketTable::Badging)
    }

    pub fn load_live(&mut self) -> Loaded<Table> {
        self.load_table(CacheKey::LiveDispatches, TicketTable::Live)
    }

    /// Sorted distinct technician names and sites.
    pub fn load_directory_options(&mut self) -> Loaded<DirectoryOptions> {
        let query = SelectQuery::all(TicketTable::Directory).columns(OPTION_COLUMNS);
        match self.fetch(CacheKey::DirectoryOptions, query) {
            Ok(raw) => {
                let distinct = |col: &str| -> Vec<String> {
                    raw.iter()
                        .filter_map(|r| r.get(col).and_then(|v| v.as_str()))
                        .map(str::to_string)
                        .collect::<BTreeSet<_>>()
                        .into_iter()
                        .collect()
                };
                let options = DirectoryOptions {
                    techs: distinct("Name"),
                    sites: distinct("Site"),
                };
                Loaded::new(options, Vec::new())
            }
            Err(e) => Loaded::new(
                DirectoryOptions::default(),
                vec![Notice::error(format!("Error loading Tech and Site data: {e}"))],
            ),
        }
    }

    /// Directory rows with a valid YES/NO badge flag.
    pub fn load_directory_badges(&mut self) -> Loaded<Vec<DirectoryEntry>> {
        let query = SelectQuery::all(TicketTable::Directory).columns(BADGE_COLUMNS);
        let raw = match self.fetch(CacheKey::DirectoryBadges, query) {
            Ok(raw) => raw,
            Err(e) => {
                return Loaded::new(
                    Vec::new(),
                    vec![Notice::error(format!(
                        "Error loading badging report data from the store: {e}"
                    ))],
                )
            }
        };
        if raw.is_empty() {
            return Loaded::new(Vec::new(), Vec::new());
        }
        let table = normalize::normalize(&raw, TicketTable::Directory.schema(), DatePolicy::Lenient);
        if let Some(col) = ["Badge", "Site", "Name"]
            .into_iter()
            .find(|c| table.missing_columns.contains(c))
        {
            return Loaded::new(
                Vec::new(),
                vec![Notice::error(format!(
                    "Column '{col}' not found in the 'names_and_sites' table. Cannot process badging data."
                ))],
            );
        }
        Loaded::new(DirectoryEntry::from_table(&table), Vec::new())
    }

    /// Badging ticket totals for the budget chart.
    pub fn load_budget_totals(&mut self) -> Loaded<Vec<f64>> {
        let query = SelectQuery::all(TicketTable::Badging).columns(BUDGET_COLUMNS);
        let raw = match self.fetch(CacheKey::BudgetTotals, query) {
            Ok(raw) => raw,
            Err(e) => {
                return Loaded::new(
                    Vec::new(),
                    vec![Notice::error(format!("Error loading budget data from the store: {e}"))],
                )
            }
        };
        if !raw.is_empty() && !raw.iter().any(|r| r.contains_key("Total")) {
            return Loaded::new(
                Vec::new(),
                vec![Notice::warning(
                    "'Total' column not found in 'badging_dispatches' table for budget calculation.",
                )],
            );
        }
        let totals = raw
            .iter()
            .map(|r| r.get("Total").map(normalize::coerce_number).unwrap_or(0.0))
            .collect();
        Loaded::new(totals, Vec::new())
    }

    /// Live dispatches for the PNL report. Only ISO dates are accepted and
    /// rows without one are dropped.
    pub fn load_pnl_tickets(&mut self) -> Loaded<Vec<LiveDispatchTicket>> {
        let query = SelectQuery::all(TicketTable::Live).order_by(DATE_COLUMN);
        let raw = match self.fetch(CacheKey::PnlTickets, query) {
            Ok(raw) => raw,
            Err(e) => {
                return Loaded::new(
                    Vec::new(),
                    vec![Notice::error(format!("Error loading live dispatches data: {e}"))],
                )
            }
        };
        if raw.is_empty() {
            return Loaded::new(
                Vec::new(),
                vec![Notice::info("No data received from 'live_dispatches' table.")],
            );
        }
        let mut table = normalize::normalize(&raw, TicketTable::Live.schema(), DatePolicy::IsoOnly);
        for required in ["SLA", DATE_COLUMN] {
            if table.missing_columns.contains(&required) {
                return Loaded::new(
                    Vec::new(),
                    vec![Notice::error(format!(
                        "Column '{required}' not found in 'live_dispatches' table. Monthly analysis will not be available."
                    ))],
                );
            }
        }
        let mut notices = Vec::new();
        let dropped = normalize::drop_undated(&mut table);
        if dropped > 0 {
            notices.push(Notice::warning(format!(
                "Removed {dropped} rows due to invalid 'Date' values."
            )));
        }
        for col in FINANCIAL_COLUMNS {
            if table.missing_columns.contains(col) {
                notices.push(Notice::warning(format!(
                    "'{col}' column not found in 'live_dispatches' table. Financial calculations for this column will be zero."
                )));
            }
        }
        Loaded::new(LiveDispatchTicket::from_table(&table), notices)
    }

    /// Insert one row; an empty echo counts as rejection.
    pub fn insert_row(&mut self, table: TicketTable, record: &RawRow) -> Result<RawRow> {
        let echoed = self.store.insert(table, record)?;
        let row = echoed.into_iter().next().ok_or_else(|| DeskError::WriteRejected {
            table: table.name().to_string(),
            id: None,
        })?;
        info!(target: "desk::store", table = table.name(), "inserted row");
        self.invalidate(table);
        Ok(row)
    }

    /// Patch one row by id. Does not invalidate: batch callers do that once.
    pub fn update_row(
        &mut self,
        table: TicketTable,
        id_column: &str,
        id: i64,
        patch: &RawRow,
    ) -> Result<RawRow> {
        let echoed = self.store.update(table, id_column, id, patch)?;
        let row = echoed.into_iter().next().ok_or_else(|| DeskError::WriteRejected {
            table: table.name().to_string(),
            id: Some(id),
        })?;
        info!(target: "desk::store", table = table.name(), id, "updated row");
        Ok(row)
    }

    pub fn invalidate(&mut self, table: TicketTable) {
        self.cache.invalidate_table(table);
    }
}
