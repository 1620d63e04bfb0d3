//! Column layouts for the three remote tables.
//!
//! The row id is not a column here: it is store-assigned, immutable, and kept
//! on each row separately so it can never end up in a write payload.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Date,
    Number,
    Currency,
    Text,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Number | ColumnKind::Currency)
    }
}

/// Whether the application may write a column or only display it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Editable,
    /// Filled in by store triggers whenever a row changes.
    StoreDerived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: ColumnKind,
    pub access: Access,
}

impl Column {
    const fn editable(name: &'static str, label: &'static str, kind: ColumnKind) -> Self {
        Self { name, label, kind, access: Access::Editable }
    }

    const fn derived(name: &'static str, label: &'static str, kind: ColumnKind) -> Self {
        Self { name, label, kind, access: Access::StoreDerived }
    }

    pub fn is_editable(&self) -> bool {
        self.access == Access::Editable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketTable {
    Badging,
    Live,
    Directory,
}

impl TicketTable {
    pub fn name(self) -> &'static str {
        match self {
            TicketTable::Badging => "badging_dispatches",
            TicketTable::Live => "live_dispatches",
            TicketTable::Directory => "names_and_sites",
        }
    }

    pub fn schema(self) -> &'static TableSchema {
        match self {
            TicketTable::Badging => &BADGING_SCHEMA,
            TicketTable::Live => &LIVE_SCHEMA,
            TicketTable::Directory => &DIRECTORY_SCHEMA,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct TableSchema {
    pub table: TicketTable,
    pub columns: &'static [Column],
}

/// Keys the store may use for the row id, in order of preference.
pub const ID_KEYS: &[&str] = &["id", "ID"];

pub const DATE_COLUMN: &str = "Date";

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    #[cfg(test)]
    pub fn editable_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_editable())
    }
}

pub static BADGING_SCHEMA: TableSchema = TableSchema {
    table: TicketTable::Badging,
    columns: &[
        Column::editable("Date", "Date", ColumnKind::Date),
        Column::editable("Tech", "Tech", ColumnKind::Text),
        Column::editable("Site", "Site", ColumnKind::Text),
        Column::editable("Hours", "Hours", ColumnKind::Number),
        Column::editable("Additional", "Additional Pay ($)", ColumnKind::Currency),
        Column::editable("Base", "Base Pay ($)", ColumnKind::Currency),
        Column::editable("Total", "Total Pay ($)", ColumnKind::Currency),
    ],
};

pub static LIVE_SCHEMA: TableSchema = TableSchema {
    table: TicketTable::Live,
    columns: &[
        Column::editable("Date", "Date", ColumnKind::Date),
        Column::editable("Tech", "Tech", ColumnKind::Text),
        Column::editable("SLA", "SLA", ColumnKind::Text),
        Column::editable("Site", "Site", ColumnKind::Text),
        Column::editable("Hours", "Hours", ColumnKind::Number),
        Column::derived("Rounded Hours", "Rounded Hours", ColumnKind::Number),
        Column::derived("Additional", "Additional ($)", ColumnKind::Currency),
        Column::derived("Base", "Base ($)", ColumnKind::Currency),
        Column::derived("DXC Rate", "DXC Rate ($)", ColumnKind::Currency),
        Column::derived("Total FN Pay", "Total FN Pay ($)", ColumnKind::Currency),
        Column::derived("Total DXC Pay", "Total DXC Pay ($)", ColumnKind::Currency),
        Column::derived("PNL", "P&L ($)", ColumnKind::Currency),
    ],
};

pub static DIRECTORY_SCHEMA: TableSchema = TableSchema {
    table: TicketTable::Directory,
    columns: &[
        Column::derived("Name", "Name", ColumnKind::Text),
        Column::derived("Site", "Site", ColumnKind::Text),
        Column::derived("Badge", "Badge", ColumnKind::Text),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_schema_exposes_only_five_editable_columns() {
        let editable: Vec<&str> = LIVE_SCHEMA.editable_columns().map(|c| c.name).collect();
        assert_eq!(editable, vec!["Date", "Tech", "SLA", "Site", "Hours"]);
        assert_eq!(LIVE_SCHEMA.columns.len() - editable.len(), 7);
    }

    #[test]
    fn badging_schema_is_fully_editable() {
        assert!(BADGING_SCHEMA.columns.iter().all(|c| c.is_editable()));
        assert_eq!(BADGING_SCHEMA.index_of("Total"), Some(6));
    }

    #[test]
    fn id_is_not_a_schema_column() {
        for schema in [&BADGING_SCHEMA, &LIVE_SCHEMA, &DIRECTORY_SCHEMA] {
            for key in ID_KEYS {
                assert!(schema.column(key).is_none());
            }
        }
    }
}
