//! Entry forms for new badging and live-dispatch tickets.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::info;

use crate::error::{DeskError, Result};
use crate::models::{RawRow, Sla};
use crate::repository::{DirectoryOptions, Repository};
use crate::schema::TicketTable;
use crate::store::RecordStore;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    Date(NaiveDate),
    Amount(f64),
    /// `options[selected]`; directory-backed choices start with a blank entry.
    Choice { options: Vec<String>, selected: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub key: &'static str,
    pub label: &'static str,
    pub input: FieldInput,
}

impl FormField {
    fn date(key: &'static str, label: &'static str, today: NaiveDate) -> Self {
        Self { key, label, input: FieldInput::Date(today) }
    }

    fn amount(key: &'static str, label: &'static str) -> Self {
        Self { key, label, input: FieldInput::Amount(0.0) }
    }

    fn choice(key: &'static str, label: &'static str, options: Vec<String>) -> Self {
        Self {
            key,
            label,
            input: FieldInput::Choice { options, selected: 0 },
        }
    }

    /// Directory choices with the blank first option.
    fn directory(key: &'static str, label: &'static str, values: &[String]) -> Self {
        let options = std::iter::once(String::new())
            .chain(values.iter().cloned())
            .collect();
        Self::choice(key, label, options)
    }

    pub fn display(&self) -> String {
        match &self.input {
            FieldInput::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldInput::Amount(n) => format!("{n:.2}"),
            FieldInput::Choice { options, selected } => {
                options.get(*selected).cloned().unwrap_or_default()
            }
        }
    }

    /// Replace the value from typed text.
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        match &mut self.input {
            FieldInput::Date(d) => {
                *d = NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| {
                    DeskError::InvalidInput(format!("{}: '{text}' is not a YYYY-MM-DD date", self.label))
                })?;
            }
            FieldInput::Amount(n) => {
                let parsed: f64 = text.parse().map_err(|_| {
                    DeskError::InvalidInput(format!("{}: '{text}' is not a number", self.label))
                })?;
                if !parsed.is_finite() || parsed < 0.0 {
                    return Err(DeskError::InvalidInput(format!(
                        "{}: value must be zero or more",
                        self.label
                    )));
                }
                *n = parsed;
            }
            FieldInput::Choice { options, selected } => {
                *selected = options.iter().position(|o| o == text).ok_or_else(|| {
                    DeskError::InvalidInput(format!("{}: '{text}' is not one of the options", self.label))
                })?;
            }
        }
        Ok(())
    }

    /// Step a choice forward or back, wrapping. Other kinds are untouched.
    pub fn cycle(&mut self, forward: bool) {
        if let FieldInput::Choice { options, selected } = &mut self.input {
            if options.is_empty() {
                return;
            }
            let len = options.len();
            *selected = if forward {
                (*selected + 1) % len
            } else {
                (*selected + len - 1) % len
            };
        }
    }

    fn to_json(&self) -> Value {
        match &self.input {
            FieldInput::Amount(n) => Value::from(*n),
            _ => Value::String(self.display()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Badging,
    Live,
}

impl FormKind {
    pub fn table(self) -> TicketTable {
        match self {
            FormKind::Badging => TicketTable::Badging,
            FormKind::Live => TicketTable::Live,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            FormKind::Badging => "Add New Badging Ticket",
            FormKind::Live => "Add New Live Dispatch Ticket",
        }
    }
}

/// Field state for one pending ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketForm {
    kind: FormKind,
    options: DirectoryOptions,
    today: NaiveDate,
    fields: Vec<FormField>,
}

impl TicketForm {
    pub fn new(kind: FormKind, options: DirectoryOptions, today: NaiveDate) -> Self {
        let fields = Self::default_fields(kind, &options, today);
        Self { kind, options, today, fields }
    }

    fn default_fields(kind: FormKind, options: &DirectoryOptions, today: NaiveDate) -> Vec<FormField> {
        match kind {
            FormKind::Badging => vec![
                FormField::date("Date", "Date", today),
                FormField::directory("Tech", "Tech", &options.techs),
                FormField::directory("Site", "Site", &options.sites),
                FormField::amount("Hours", "Hours"),
                FormField::amount("Base", "Base ($)"),
                FormField::amount("Additional", "Additional ($)"),
            ],
            FormKind::Live => vec![
                FormField::date("Date", "Date", today),
                FormField::directory("Tech", "Tech", &options.techs),
                FormField::choice(
                    "SLA",
                    "SLA",
                    Sla::ALL.iter().map(|s| s.label().to_string()).collect(),
                ),
                FormField::directory("Site", "Site", &options.sites),
                FormField::amount("Hours", "Hours"),
                FormField::amount("Additional", "Additional ($)"),
            ],
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field_mut(&mut self, index: usize) -> Option<&mut FormField> {
        self.fields.get_mut(index)
    }

    /// Set a field by its column key.
    pub fn set(&mut self, key: &str, text: &str) -> Result<()> {
        self.fields
            .iter_mut()
            .find(|f| f.key == key)
            .ok_or_else(|| DeskError::InvalidInput(format!("unknown field '{key}'")))?
            .set_text(text)
    }

    fn amount(&self, key: &str) -> f64 {
        self.fields
            .iter()
            .find_map(|f| match (f.key == key, &f.input) {
                (true, FieldInput::Amount(n)) => Some(*n),
                _ => None,
            })
            .unwrap_or(0.0)
    }

    /// Badging total shown while the form is filled in.
    pub fn total(&self) -> Option<f64> {
        match self.kind {
            FormKind::Badging => Some(self.amount("Base") + self.amount("Additional")),
            FormKind::Live => None,
        }
    }

    pub fn to_record(&self) -> RawRow {
        let mut record: RawRow = self
            .fields
            .iter()
            .map(|f| (f.key.to_string(), f.to_json()))
            .collect();
        if let Some(total) = self.total() {
            record.insert("Total".into(), Value::from(total));
        }
        record
    }

    pub fn reset(&mut self) {
        self.fields = Self::default_fields(self.kind, &self.options, self.today);
    }

    /// Insert the record. Resets on success; on failure the values stay.
    pub fn submit<S: RecordStore>(&mut self, repo: &mut Repository<S>) -> Result<RawRow> {
        let table = self.kind.table();
        let row = repo.insert_row(table, &self.to_record())?;
        info!(target: "desk::form", table = table.name(), "ticket added");
        self.reset();
        Ok(row)
    }
}
