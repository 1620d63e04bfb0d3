use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Store rejected request ({status}): {message}")]
    Store { status: u16, message: String },

    #[error("Column '{0}' not found in response")]
    SchemaMismatch(String),

    #[error("Store did not echo back data for {table}{}", row_suffix(.id))]
    WriteRejected { table: String, id: Option<i64> },

    #[error("Column '{0}' is computed by the store and cannot be edited")]
    ReadOnlyColumn(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DeskError>;

fn row_suffix(id: &Option<i64>) -> String {
    id.map(|i| format!(" row {i}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_rejected_mentions_row_id() {
        let e = DeskError::WriteRejected {
            table: "badging_dispatches".into(),
            id: Some(7),
        };
        assert_eq!(
            e.to_string(),
            "Store did not echo back data for badging_dispatches row 7"
        );
    }

    #[test]
    fn write_rejected_without_id() {
        let e = DeskError::WriteRejected {
            table: "live_dispatches".into(),
            id: None,
        };
        assert_eq!(e.to_string(), "Store did not echo back data for live_dispatches");
    }
}
