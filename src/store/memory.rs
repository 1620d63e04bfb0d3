use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use serde_json::Value;

use super::{RecordStore, SelectQuery};
use crate::error::{DeskError, Result};
use crate::models::RawRow;
use crate::schema::TicketTable;

/// In-process store. Rows are kept as given: no trigger columns are computed,
/// so derived fields only hold what was seeded.
#[derive(Default)]
pub struct MemoryStore {
    tables: RefCell<HashMap<TicketTable, Vec<RawRow>>>,
    select_calls: Cell<usize>,
    offline: Cell<bool>,
    silent_ids: RefCell<HashSet<i64>>,
    silent_inserts: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, table: TicketTable, rows: Vec<RawRow>) {
        self.tables.borrow_mut().insert(table, rows);
    }

    pub fn rows(&self, table: TicketTable) -> Vec<RawRow> {
        self.tables
            .borrow()
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    #[cfg(test)]
    /// Number of `select` calls served so far.
    pub fn select_calls(&self) -> usize {
        self.select_calls.get()
    }

    #[cfg(test)]
    /// Make every call fail as if the host were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    #[cfg(test)]
    /// Accept updates for `id` without echoing any row back.
    pub fn swallow_updates_for(&self, id: i64) {
        self.silent_ids.borrow_mut().insert(id);
    }

    #[cfg(test)]
    /// Accept inserts without echoing any row back.
    pub fn swallow_inserts(&self, silent: bool) {
        self.silent_inserts.set(silent);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.get() {
            return Err(DeskError::Other("store unreachable".into()));
        }
        Ok(())
    }
}

fn row_id(row: &RawRow, id_column: &str) -> Option<i64> {
    row.get(id_column).and_then(Value::as_i64)
}

fn sort_key(row: &RawRow, column: &str) -> String {
    match row.get(column) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

impl RecordStore for MemoryStore {
    fn select(&self, query: &SelectQuery) -> Result<Vec<RawRow>> {
        self.check_online()?;
        self.select_calls.set(self.select_calls.get() + 1);
        let mut rows = self.rows(query.table);
        if let Some(col) = query.order_by {
            rows.sort_by_key(|r| sort_key(r, col));
        }
        if let Some(cols) = query.columns {
            rows = rows
                .into_iter()
                .map(|r| {
                    r.into_iter()
                        .filter(|(k, _)| cols.contains(&k.as_str()))
                        .collect()
                })
                .collect();
        }
        Ok(rows)
    }

    fn insert(&self, table: TicketTable, record: &RawRow) -> Result<Vec<RawRow>> {
        self.check_online()?;
        if self.silent_inserts.get() {
            return Ok(Vec::new());
        }
        let mut tables = self.tables.borrow_mut();
        let rows = tables.entry(table).or_default();
        let next_id = rows.iter().filter_map(|r| row_id(r, "id")).max().unwrap_or(0) + 1;
        let mut row = record.clone();
        row.insert("id".into(), Value::from(next_id));
        rows.push(row.clone());
        Ok(vec![row])
    }

    fn update(
        &self,
        table: TicketTable,
        id_column: &str,
        id: i64,
        patch: &RawRow,
    ) -> Result<Vec<RawRow>> {
        self.check_online()?;
        if self.silent_ids.borrow().contains(&id) {
            return Ok(Vec::new());
        }
        let mut tables = self.tables.borrow_mut();
        let Some(rows) = tables.get_mut(&table) else {
            return Ok(Vec::new());
        };
        let mut echoed = Vec::new();
        for row in rows.iter_mut().filter(|r| row_id(r, id_column) == Some(id)) {
            for (k, v) in patch {
                row.insert(k.clone(), v.clone());
            }
            echoed.push(row.clone());
        }
        Ok(echoed)
    }
}
