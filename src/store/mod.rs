//! Transport to the remote relational store.
//!
//! [`RecordStore`] is the seam: [`rest::RestStore`] speaks the PostgREST
//! dialect over HTTP, [`memory::MemoryStore`] keeps rows in process for the
//! demo and for tests.

pub mod memory;
pub mod rest;

use crate::error::Result;
use crate::models::RawRow;
use crate::schema::TicketTable;

#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub table: TicketTable,
    /// `None` selects every column.
    pub columns: Option<&'static [&'static str]>,
    /// Ascending sort column.
    pub order_by: Option<&'static str>,
}

impl SelectQuery {
    pub fn all(table: TicketTable) -> Self {
        Self {
            table,
            columns: None,
            order_by: None,
        }
    }

    pub fn columns(mut self, columns: &'static [&'static str]) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn order_by(mut self, column: &'static str) -> Self {
        self.order_by = Some(column);
        self
    }
}

pub trait RecordStore {
    fn select(&self, query: &SelectQuery) -> Result<Vec<RawRow>>;

    /// Insert one row; returns whatever rows the store echoed back.
    fn insert(&self, table: TicketTable, record: &RawRow) -> Result<Vec<RawRow>>;

    /// Update the row whose `id_column` equals `id`; returns the echoed rows.
    fn update(
        &self,
        table: TicketTable,
        id_column: &str,
        id: i64,
        patch: &RawRow,
    ) -> Result<Vec<RawRow>>;
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn select(&self, query: &SelectQuery) -> Result<Vec<RawRow>> {
        (**self).select(query)
    }

    fn insert(&self, table: TicketTable, record: &RawRow) -> Result<Vec<RawRow>> {
        (**self).insert(table, record)
    }

    fn update(
        &self,
        table: TicketTable,
        id_column: &str,
        id: i64,
        patch: &RawRow,
    ) -> Result<Vec<RawRow>> {
        (**self).update(table, id_column, id, patch)
    }
}
