use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::models::{CellValue, RawRow, Row, Table};
use crate::schema::{ColumnKind, TableSchema, ID_KEYS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePolicy {
    /// Accept the common date and timestamp spellings.
    Lenient,
    /// Only `YYYY-MM-DD`, optionally followed by a time part.
    IsoOnly,
}

/// Coerce raw store rows into a [`Table`] carrying every schema column.
///
/// Absent columns get their kind's default and are listed in
/// `missing_columns`; unparsable dates become missing, unparsable numbers 0.0,
/// and everything else is rendered as text. Keys outside the schema are ignored.
pub fn normalize(raw: &[RawRow], schema: &'static TableSchema, dates: DatePolicy) -> Table {
    let id_column = ID_KEYS
        .iter()
        .find(|key| raw.iter().any(|r| r.contains_key(**key)))
        .unwrap_or(&ID_KEYS[0])
        .to_string();

    let missing_columns = schema
        .columns
        .iter()
        .filter(|c| !raw.iter().any(|r| r.contains_key(c.name)))
        .map(|c| c.name)
        .collect();

    let rows = raw
        .iter()
        .map(|r| Row {
            id: r.get(&id_column).and_then(coerce_id),
            cells: schema
                .columns
                .iter()
                .map(|c| match r.get(c.name) {
                    Some(v) => coerce(v, c.kind, dates),
                    None => CellValue::default_for(c.kind),
                })
                .collect(),
        })
        .collect();

    Table {
        schema,
        id_column,
        rows,
        missing_columns,
    }
}

/// Remove rows whose date is missing. Returns how many were dropped.
pub fn drop_undated(table: &mut Table) -> usize {
    let Some(idx) = table.schema.index_of(crate::schema::DATE_COLUMN) else {
        return 0;
    };
    let before = table.rows.len();
    table
        .rows
        .retain(|r| matches!(r.cells.get(idx), Some(CellValue::Date(Some(_)))));
    before - table.rows.len()
}

fn coerce(value: &Value, kind: ColumnKind, dates: DatePolicy) -> CellValue {
    match kind {
        ColumnKind::Date => CellValue::Date(value.as_str().and_then(|s| parse_date(s, dates))),
        ColumnKind::Number | ColumnKind::Currency => CellValue::Number(coerce_number(value)),
        ColumnKind::Text => CellValue::Text(coerce_text(value)),
    }
}

fn coerce_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|f| f.is_finite()).unwrap_or(0.0)
}

fn coerce_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn parse_date(s: &str, policy: DatePolicy) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let head = s.get(..10).unwrap_or(s);
    let tail = s.get(10..).unwrap_or("");
    if let Ok(d) = NaiveDate::parse_from_str(head, "%Y-%m-%d") {
        if tail.is_empty() || tail.starts_with('T') || tail.starts_with(' ') {
            return Some(d);
        }
    }
    if policy == DatePolicy::IsoOnly {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(s, "%m/%d/%Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BADGING_SCHEMA, LIVE_SCHEMA};
    use serde_json::json;

    fn rows(v: serde_json::Value) -> Vec<RawRow> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_absent_columns_get_type_defaults() {
        let raw = rows(json!([{"id": 1, "Tech": "Ana"}]));
        let t = normalize(&raw, &BADGING_SCHEMA, DatePolicy::Lenient);
        assert_eq!(t.rows[0].cells.len(), BADGING_SCHEMA.columns.len());
        assert_eq!(t.cell(0, "Date"), Some(&CellValue::Date(None)));
        assert_eq!(t.cell(0, "Hours"), Some(&CellValue::Number(0.0)));
        assert_eq!(t.cell(0, "Total"), Some(&CellValue::Number(0.0)));
        assert_eq!(t.cell(0, "Site"), Some(&CellValue::Text(String::new())));
        assert_eq!(t.cell(0, "Tech"), Some(&CellValue::Text("Ana".into())));
        assert!(t.missing_columns.contains(&"Date"));
        assert!(t.missing_columns.contains(&"Site"));
        assert!(!t.missing_columns.contains(&"Tech"));
    }

    #[test]
    fn test_every_live_column_present_when_response_is_sparse() {
        let raw = rows(json!([{"ID": 4, "SLA": "2 Hour"}]));
        let t = normalize(&raw, &LIVE_SCHEMA, DatePolicy::Lenient);
        assert_eq!(t.id_column, "ID");
        assert_eq!(t.rows[0].id, Some(4));
        for col in LIVE_SCHEMA.columns {
            assert!(t.cell(0, col.name).is_some(), "missing {}", col.name);
        }
        assert_eq!(t.missing_columns.len(), LIVE_SCHEMA.columns.len() - 1);
    }

    #[test]
    fn test_unparsable_values_coerced() {
        let raw = rows(json!([
            {"id": 1, "Date": "not a date", "Hours": "abc", "Base": null, "Total": "12.5", "Tech": null, "Site": 7}
        ]));
        let t = normalize(&raw, &BADGING_SCHEMA, DatePolicy::Lenient);
        assert_eq!(t.cell(0, "Date"), Some(&CellValue::Date(None)));
        assert_eq!(t.cell(0, "Hours"), Some(&CellValue::Number(0.0)));
        assert_eq!(t.cell(0, "Base"), Some(&CellValue::Number(0.0)));
        assert_eq!(t.cell(0, "Total"), Some(&CellValue::Number(12.5)));
        assert_eq!(t.cell(0, "Tech"), Some(&CellValue::Text(String::new())));
        assert_eq!(t.cell(0, "Site"), Some(&CellValue::Text("7".into())));
    }

    #[test]
    fn test_date_forms() {
        let d = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();
        assert_eq!(parse_date("2025-04-02", DatePolicy::Lenient), Some(d));
        assert_eq!(parse_date("2025-04-02T10:00:00", DatePolicy::Lenient), Some(d));
        assert_eq!(parse_date("2025-04-02T10:00:00+00:00", DatePolicy::Lenient), Some(d));
        assert_eq!(parse_date("2025-04-02 08:15:00", DatePolicy::Lenient), Some(d));
        assert_eq!(parse_date("04/02/2025", DatePolicy::Lenient), Some(d));
        assert_eq!(parse_date("04/02/2025", DatePolicy::IsoOnly), None);
        assert_eq!(parse_date("2025-04-02", DatePolicy::IsoOnly), Some(d));
        assert_eq!(parse_date("2025-13-02", DatePolicy::Lenient), None);
        assert_eq!(parse_date("", DatePolicy::Lenient), None);
    }

    #[test]
    fn test_drop_undated_counts_removed_rows() {
        let raw = rows(json!([
            {"id": 1, "Date": "2025-01-03"},
            {"id": 2, "Date": "01/03/2025"},
            {"id": 3, "Date": null},
        ]));
        let mut t = normalize(&raw, &LIVE_SCHEMA, DatePolicy::IsoOnly);
        assert_eq!(drop_undated(&mut t), 2);
        assert_eq!(t.rows.len(), 1);
        assert_eq!(t.rows[0].id, Some(1));
    }

    #[test]
    fn test_empty_response_reports_all_columns_missing() {
        let t = normalize(&[], &BADGING_SCHEMA, DatePolicy::Lenient);
        assert!(t.rows.is_empty());
        assert_eq!(t.id_column, "id");
        assert_eq!(t.missing_columns.len(), BADGING_SCHEMA.columns.len());
    }
}
