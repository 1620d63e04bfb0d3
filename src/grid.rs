//! Working copy of one table with cell-level diffing and bulk write-back.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::{DeskError, Result};
use crate::models::{CellValue, RawRow, Table};
use crate::repository::{Loaded, Notice, Repository};
use crate::schema::{ColumnKind, TicketTable};
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridState {
    Unloaded,
    Loaded,
    Dirty,
    Saving,
    /// Every row of the last save failed; the edits are kept for a retry.
    Error,
}

/// Changed cells keyed by row index, then column name.
pub type GridDiff = BTreeMap<usize, BTreeMap<&'static str, CellValue>>;

#[derive(Debug, Clone, PartialEq)]
pub struct RowPatch {
    pub row: usize,
    pub id: Option<i64>,
    pub patch: RawRow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    pub row: usize,
    pub id: Option<i64>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    pub updated: Vec<i64>,
    pub failures: Vec<RowFailure>,
    pub no_changes: bool,
}

impl SaveReport {
    pub fn all_failed(&self) -> bool {
        !self.no_changes && self.updated.is_empty() && !self.failures.is_empty()
    }
}

pub struct GridController {
    table: TicketTable,
    state: GridState,
    baseline: Table,
    working: Table,
    notices: Vec<Notice>,
}

impl GridController {
    pub fn new(table: TicketTable) -> Self {
        Self {
            table,
            state: GridState::Unloaded,
            baseline: Table::empty(table.schema()),
            working: Table::empty(table.schema()),
            notices: Vec::new(),
        }
    }

    pub fn table(&self) -> TicketTable {
        self.table
    }

    pub fn state(&self) -> GridState {
        self.state
    }

    pub fn working(&self) -> &Table {
        &self.working
    }

    #[cfg(test)]
    pub fn baseline(&self) -> &Table {
        &self.baseline
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn load<S: RecordStore>(&mut self, repo: &mut Repository<S>) {
        let loaded = match self.table {
            TicketTable::Badging => repo.load_badging(),
            TicketTable::Live => repo.load_live(),
            TicketTable::Directory => Loaded::new(Table::empty(self.table.schema()), Vec::new()),
        };
        self.baseline = loaded.data.clone();
        self.working = loaded.data;
        self.notices = loaded.notices;
        self.state = GridState::Loaded;
    }

    /// Drop cached reads for this table and load again from the store.
    pub fn reload<S: RecordStore>(&mut self, repo: &mut Repository<S>) {
        repo.invalidate(self.table);
        self.load(repo);
    }

    /// Fails for unknown and store-derived columns, leaving a warning notice
    /// for the latter.
    pub fn check_editable(&mut self, column: &str) -> Result<usize> {
        let schema = self.working.schema;
        let idx = schema
            .index_of(column)
            .ok_or_else(|| DeskError::InvalidInput(format!("unknown column '{column}'")))?;
        if !schema.columns[idx].is_editable() {
            let err = DeskError::ReadOnlyColumn(column.to_string());
            warn!(target: "desk::grid", column, "edit of store-derived column rejected");
            self.notices.push(Notice::warning(err.to_string()));
            return Err(err);
        }
        Ok(idx)
    }

    pub fn edit_cell(&mut self, row: usize, column: &str, value: CellValue) -> Result<()> {
        let idx = self.check_editable(column)?;
        if matches!(self.state, GridState::Unloaded | GridState::Saving) {
            return Err(DeskError::InvalidInput("grid is not ready for edits".into()));
        }
        let cell = self
            .working
            .rows
            .get_mut(row)
            .and_then(|r| r.cells.get_mut(idx))
            .ok_or_else(|| DeskError::InvalidInput(format!("row {row} is out of range")))?;
        *cell = value;
        self.state = if self.diff().is_empty() {
            GridState::Loaded
        } else {
            GridState::Dirty
        };
        Ok(())
    }

    /// Parse operator text for `column` and apply it.
    pub fn edit_input(&mut self, row: usize, column: &str, input: &str) -> Result<()> {
        let kind = self
            .working
            .schema
            .column(column)
            .map(|c| c.kind)
            .ok_or_else(|| DeskError::InvalidInput(format!("unknown column '{column}'")))?;
        let value = parse_input(kind, input)?;
        self.edit_cell(row, column, value)
    }

    pub fn diff(&self) -> GridDiff {
        let columns = self.working.schema.columns;
        let mut diff = GridDiff::new();
        for (i, row) in self.working.rows.iter().enumerate() {
            let Some(base) = self.baseline.rows.get(i) else {
                continue;
            };
            let changed: BTreeMap<_, _> = columns
                .iter()
                .zip(row.cells.iter().zip(&base.cells))
                .filter(|(_, (now, was))| now != was)
                .map(|(col, (now, _))| (col.name, now.clone()))
                .collect();
            if !changed.is_empty() {
                diff.insert(i, changed);
            }
        }
        diff
    }

    /// One patch per changed row, editable columns only.
    pub fn build_patches(&self) -> Vec<RowPatch> {
        let schema = self.working.schema;
        self.diff()
            .into_iter()
            .filter_map(|(row, cells)| {
                let patch: RawRow = cells
                    .into_iter()
                    .filter(|(name, _)| schema.column(name).is_some_and(|c| c.is_editable()))
                    .map(|(name, value)| (name.to_string(), value.to_json()))
                    .collect();
                if patch.is_empty() {
                    return None;
                }
                Some(RowPatch {
                    row,
                    id: self.working.rows[row].id,
                    patch,
                })
            })
            .collect()
    }

    /// Write every changed row. A failed row does not stop the batch.
    pub fn save<S: RecordStore>(&mut self, repo: &mut Repository<S>) -> SaveReport {
        let patches = self.build_patches();
        let mut report = SaveReport::default();
        if patches.is_empty() {
            report.no_changes = true;
            self.reload(repo);
            self.notices
                .push(Notice::info("No changes detected in the table to save."));
            return report;
        }

        self.state = GridState::Saving;
        let id_column = self.working.id_column.clone();
        let mut save_notices = Vec::new();
        for p in patches {
            let result = match p.id {
                Some(id) => repo.update_row(self.table, &id_column, id, &p.patch).map(|_| id),
                None => Err(DeskError::InvalidInput(format!(
                    "row {} has no id and cannot be updated",
                    p.row + 1
                ))),
            };
            match result {
                Ok(id) => {
                    save_notices.push(Notice::success(format!("Row with ID {id} updated successfully!")));
                    report.updated.push(id);
                }
                Err(e) => {
                    warn!(target: "desk::grid", table = self.table.name(), row = p.row, error = %e, "row update failed");
                    let label = p.id.map(|id| id.to_string()).unwrap_or_else(|| "?".into());
                    save_notices.push(Notice::error(format!("Failed to update row {label}: {e}")));
                    report.failures.push(RowFailure {
                        row: p.row,
                        id: p.id,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            target: "desk::grid",
            table = self.table.name(),
            updated = report.updated.len(),
            failed = report.failures.len(),
            "save finished"
        );

        if report.all_failed() {
            self.state = GridState::Error;
            self.notices = save_notices;
        } else {
            self.reload(repo);
            self.notices.extend(save_notices);
        }
        report
    }
}

/// Grid cell text to a typed value. Dates are `YYYY-MM-DD` (blank clears),
/// numbers must be non-negative, text is taken as-is.
pub fn parse_input(kind: ColumnKind, input: &str) -> Result<CellValue> {
    let trimmed = input.trim();
    match kind {
        ColumnKind::Date if trimmed.is_empty() => Ok(CellValue::Date(None)),
        ColumnKind::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(|d| CellValue::Date(Some(d)))
            .map_err(|_| DeskError::InvalidInput(format!("'{trimmed}' is not a YYYY-MM-DD date"))),
        ColumnKind::Number | ColumnKind::Currency => {
            let n: f64 = trimmed
                .trim_start_matches('$')
                .replace(',', "")
                .parse()
                .map_err(|_| DeskError::InvalidInput(format!("'{trimmed}' is not a number")))?;
            if !n.is_finite() || n < 0.0 {
                return Err(DeskError::InvalidInput(format!("'{trimmed}' must be zero or more")));
            }
            Ok(CellValue::Number(n))
        }
        ColumnKind::Text => Ok(CellValue::Text(input.to_string())),
    }
}
