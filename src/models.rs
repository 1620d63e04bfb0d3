use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::schema::{ColumnKind, TableSchema};

/// A row as it crosses the wire: column name to JSON value.
pub type RawRow = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Date(Option<NaiveDate>),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Default used when a schema column is absent from a response.
    pub fn default_for(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Date => CellValue::Date(None),
            ColumnKind::Number | ColumnKind::Currency => CellValue::Number(0.0),
            ColumnKind::Text => CellValue::Text(String::new()),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            CellValue::Number(n) => *n,
            _ => 0.0,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => *d,
            _ => None,
        }
    }

    pub fn as_text(&self) -> &str {
        match self {
            CellValue::Text(s) => s,
            _ => "",
        }
    }

    /// JSON form sent to the store: ISO date or null, float, or string.
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Date(Some(d)) => Value::String(d.format("%Y-%m-%d").to_string()),
            CellValue::Date(None) => Value::Null,
            CellValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::Text(s) => Value::String(s.clone()),
        }
    }

    /// Plain display form used by grids and text tables.
    pub fn display(&self, kind: ColumnKind) -> String {
        match (self, kind) {
            (CellValue::Date(Some(d)), _) => d.format("%Y-%m-%d").to_string(),
            (CellValue::Date(None), _) => String::new(),
            (CellValue::Number(n), ColumnKind::Currency) => crate::fmt::money(*n),
            (CellValue::Number(n), _) => format!("{n:.2}"),
            (CellValue::Text(s), _) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: Option<i64>,
    /// Parallel to the schema's column list.
    pub cells: Vec<CellValue>,
}

/// A normalized result set: every schema column present on every row.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub schema: &'static TableSchema,
    /// Key the store used for the row id (`id` or `ID`).
    pub id_column: String,
    pub rows: Vec<Row>,
    /// Schema columns that no row in the response carried.
    pub missing_columns: Vec<&'static str>,
}

impl Table {
    pub fn empty(schema: &'static TableSchema) -> Self {
        Self {
            schema,
            id_column: crate::schema::ID_KEYS[0].to_string(),
            rows: Vec::new(),
            missing_columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[cfg(test)]
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.schema.index_of(column)?;
        self.rows.get(row)?.cells.get(idx)
    }

    pub fn position_of_id(&self, id: i64) -> Option<usize> {
        self.rows.iter().position(|r| r.id == Some(id))
    }

    fn value(&self, row: &Row, column: &str) -> CellValue {
        self.schema
            .index_of(column)
            .and_then(|i| row.cells.get(i).cloned())
            .unwrap_or(CellValue::Text(String::new()))
    }
}

// ---------------------------------------------------------------------------
// Typed views over normalized rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sla {
    TwoHour,
    FourHour,
    TwoDay,
    FourDay,
}

impl Sla {
    pub const ALL: [Sla; 4] = [Sla::TwoHour, Sla::FourHour, Sla::TwoDay, Sla::FourDay];

    pub fn label(self) -> &'static str {
        match self {
            Sla::TwoHour => "2 Hour",
            Sla::FourHour => "4 Hour",
            Sla::TwoDay => "2 Day",
            Sla::FourDay => "4 Day",
        }
    }

    /// Exact match against the four store spellings; anything else is free text.
    pub fn parse(value: &str) -> Option<Self> {
        Sla::ALL.into_iter().find(|s| s.label() == value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveDispatchTicket {
    pub id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub tech: String,
    pub sla: String,
    pub site: String,
    pub hours: f64,
    pub rounded_hours: f64,
    pub additional: f64,
    pub base: f64,
    pub dxc_rate: f64,
    pub total_fn_pay: f64,
    pub total_dxc_pay: f64,
    pub pnl: f64,
}

impl LiveDispatchTicket {
    pub fn from_table(table: &Table) -> Vec<Self> {
        table
            .rows
            .iter()
            .map(|r| Self {
                id: r.id,
                date: table.value(r, "Date").as_date(),
                tech: table.value(r, "Tech").as_text().to_string(),
                sla: table.value(r, "SLA").as_text().to_string(),
                site: table.value(r, "Site").as_text().to_string(),
                hours: table.value(r, "Hours").as_f64(),
                rounded_hours: table.value(r, "Rounded Hours").as_f64(),
                additional: table.value(r, "Additional").as_f64(),
                base: table.value(r, "Base").as_f64(),
                dxc_rate: table.value(r, "DXC Rate").as_f64(),
                total_fn_pay: table.value(r, "Total FN Pay").as_f64(),
                total_dxc_pay: table.value(r, "Total DXC Pay").as_f64(),
                pnl: table.value(r, "PNL").as_f64(),
            })
            .collect()
    }

    pub fn known_sla(&self) -> Option<Sla> {
        Sla::parse(&self.sla)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeStatus {
    Yes,
    No,
}

impl BadgeStatus {
    /// Upper-case and trim, accept Y/N shorthands, reject everything else.
    pub fn normalize(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "YES" | "Y" => Some(BadgeStatus::Yes),
            "NO" | "N" => Some(BadgeStatus::No),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BadgeStatus::Yes => "YES",
            BadgeStatus::No => "NO",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryEntry {
    pub name: String,
    pub site: String,
    pub badge: BadgeStatus,
}

impl DirectoryEntry {
    /// Rows whose badge flag does not normalize to YES/NO are dropped.
    pub fn from_table(table: &Table) -> Vec<Self> {
        table
            .rows
            .iter()
            .filter_map(|r| {
                let badge = BadgeStatus::normalize(table.value(r, "Badge").as_text())?;
                Some(Self {
                    name: table.value(r, "Name").as_text().to_string(),
                    site: table.value(r, "Site").as_text().to_string(),
                    badge,
                })
            })
            .collect()
    }
}
