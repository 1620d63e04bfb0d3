use chrono::Local;
use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use super::{parse_assignment, print_notices, EditArgs};
use crate::error::{DeskError, Result};
use crate::form::{FormKind, TicketForm};
use crate::grid::GridController;
use crate::models::Table as TicketRows;
use crate::repository::{Notice, NoticeLevel, Repository};
use crate::schema::TicketTable;
use crate::store::RecordStore;

/// Render a normalized table the way the grid shows it.
pub fn format_rows(rows: &TicketRows) -> String {
    let mut table = Table::new();
    let mut header = vec![Cell::new("ID")];
    header.extend(rows.schema.columns.iter().map(|c| Cell::new(c.label)));
    table.set_header(header);
    for row in &rows.rows {
        let mut cells = vec![Cell::new(row.id.map(|i| i.to_string()).unwrap_or_default())];
        for (col, value) in rows.schema.columns.iter().zip(&row.cells) {
            let cell = Cell::new(value.display(col.kind));
            cells.push(if col.kind.is_numeric() {
                cell.set_alignment(CellAlignment::Right)
            } else {
                cell
            });
        }
        table.add_row(cells);
    }
    table.to_string()
}

pub fn list<S: RecordStore>(repo: &mut Repository<S>, table: TicketTable) -> Result<()> {
    let loaded = match table {
        TicketTable::Live => repo.load_live(),
        _ => repo.load_badging(),
    };
    print_notices(&loaded.notices);
    if !loaded.data.is_empty() {
        println!("{}", format_rows(&loaded.data));
        println!("{} rows", loaded.data.len());
    }
    Ok(())
}

/// Field values for `add`, in form-field key order. `None` keeps the default.
pub type FieldValues<'a> = Vec<(&'static str, Option<&'a str>)>;

pub fn add<S: RecordStore>(repo: &mut Repository<S>, kind: FormKind, values: FieldValues) -> Result<()> {
    let options = repo.load_directory_options();
    print_notices(&options.notices);
    let mut form = TicketForm::new(kind, options.data, Local::now().date_naive());
    for (key, value) in values {
        if let Some(v) = value {
            // Directory names are matched exactly; anything else is an input error.
            form.set(key, v)?;
        }
    }
    let total = form.total();
    let row = match form.submit(repo) {
        Ok(row) => row,
        Err(e) => {
            print_notices(&[Notice::error(format!("Failed to add new ticket: {e}"))]);
            return Ok(());
        }
    };
    let id = row
        .get("id")
        .or_else(|| row.get("ID"))
        .map(|v| v.to_string())
        .unwrap_or_else(|| "?".into());
    match kind {
        FormKind::Badging => println!(
            "{} (id {id}, total {})",
            "New ticket added successfully!".green(),
            crate::fmt::money(total.unwrap_or(0.0))
        ),
        FormKind::Live => println!(
            "{} (id {id}). Triggers should populate other fields.",
            "New live ticket added successfully!".green()
        ),
    }
    Ok(())
}

pub fn edit<S: RecordStore>(repo: &mut Repository<S>, table: TicketTable, args: &EditArgs) -> Result<()> {
    let mut grid = GridController::new(table);
    grid.load(repo);
    if grid.notices().iter().any(|n| n.level == NoticeLevel::Error) {
        print_notices(grid.notices());
        return Ok(());
    }
    let row = grid.working().position_of_id(args.id).ok_or_else(|| {
        DeskError::InvalidInput(format!("no row with id {} in '{}'", args.id, table.name()))
    })?;
    for raw in &args.assignments {
        let (column, value) = parse_assignment(raw)?;
        grid.edit_input(row, &column, &value)?;
    }
    // Write failures are reported as notices, like the grid does.
    grid.save(repo);
    print_notices(grid.notices());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, DatePolicy};
    use crate::store::memory::MemoryStore;
    use serde_json::json;

    fn live_repo() -> Repository<MemoryStore> {
        let store = MemoryStore::new();
        store.seed(
            TicketTable::Live,
            vec![json!({"id": 5, "Date": "2025-04-01", "Tech": "Ana", "SLA": "2 Hour",
                        "Site": "North", "Hours": 1.0, "PNL": 12.5})
                .as_object()
                .unwrap()
                .clone()],
        );
        Repository::new(store)
    }

    #[test]
    fn test_format_rows_shows_id_and_money() {
        let raw = vec![json!({"id": 9, "Tech": "Ana", "Total": 1250.0})
            .as_object()
            .unwrap()
            .clone()];
        let t = normalize(&raw, TicketTable::Badging.schema(), DatePolicy::Lenient);
        let out = format_rows(&t);
        assert!(out.contains("Total Pay ($)"));
        assert!(out.contains("$1,250.00"));
        assert!(out.contains('9'));
    }

    #[test]
    fn test_edit_writes_only_requested_cells() {
        let mut repo = live_repo();
        let args = EditArgs {
            id: 5,
            assignments: vec!["Hours=3".into(), "Site=South".into()],
        };
        edit(&mut repo, TicketTable::Live, &args).unwrap();
        let row = &repo.store().rows(TicketTable::Live)[0];
        assert_eq!(row["Hours"], json!(3.0));
        assert_eq!(row["Site"], json!("South"));
        assert_eq!(row["PNL"], json!(12.5));
    }

    #[test]
    fn test_edit_of_derived_column_is_refused() {
        let mut repo = live_repo();
        let args = EditArgs {
            id: 5,
            assignments: vec!["PNL=99".into()],
        };
        let err = edit(&mut repo, TicketTable::Live, &args).unwrap_err();
        assert!(matches!(err, DeskError::ReadOnlyColumn(_)));
        assert_eq!(repo.store().rows(TicketTable::Live)[0]["PNL"], json!(12.5));
    }

    #[test]
    fn test_edit_unknown_id() {
        let mut repo = live_repo();
        let args = EditArgs {
            id: 77,
            assignments: vec!["Hours=3".into()],
        };
        assert!(edit(&mut repo, TicketTable::Live, &args).is_err());
    }

    #[test]
    fn test_add_rejected_by_store_is_not_fatal() {
        let store = MemoryStore::new();
        store.swallow_inserts(true);
        let mut repo = Repository::new(store);
        add(&mut repo, FormKind::Badging, vec![("Base", Some("100"))]).unwrap();
        assert!(repo.store().rows(TicketTable::Badging).is_empty());
    }

    #[test]
    fn test_edit_stops_when_the_load_fails() {
        let mut repo = live_repo();
        repo.store().set_offline(true);
        let args = EditArgs {
            id: 5,
            assignments: vec!["Hours=3".into()],
        };
        edit(&mut repo, TicketTable::Live, &args).unwrap();
        repo.store().set_offline(false);
        assert_eq!(repo.store().rows(TicketTable::Live)[0]["Hours"], json!(1.0));
    }

    #[test]
    fn test_edit_rejected_by_store_is_not_fatal() {
        let mut repo = live_repo();
        repo.store().swallow_updates_for(5);
        let args = EditArgs {
            id: 5,
            assignments: vec!["Hours=3".into()],
        };
        edit(&mut repo, TicketTable::Live, &args).unwrap();
        assert_eq!(repo.store().rows(TicketTable::Live)[0]["Hours"], json!(1.0));
    }

    #[test]
    fn test_add_badging_records_total() {
        let mut repo = Repository::new(MemoryStore::new());
        add(
            &mut repo,
            FormKind::Badging,
            vec![("Base", Some("100")), ("Additional", Some("25")), ("Hours", None)],
        )
        .unwrap();
        let rows = repo.store().rows(TicketTable::Badging);
        assert_eq!(rows[0]["Total"], json!(125.0));
        assert_eq!(rows[0]["Hours"], json!(0.0));
    }
}
