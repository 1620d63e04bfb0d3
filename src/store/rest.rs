use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use super::{RecordStore, SelectQuery};
use crate::error::{DeskError, Result};
use crate::models::RawRow;
use crate::schema::TicketTable;
use crate::settings::StoreCredentials;

/// PostgREST client for `<url>/rest/v1/<table>`.
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(credentials: &StoreCredentials) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("dispatch-desk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: credentials.url.trim_end_matches('/').to_string(),
            api_key: credentials.key.clone(),
        })
    }

    fn endpoint(&self, table: TicketTable) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn read_rows(resp: Response) -> Result<Vec<RawRow>> {
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(DeskError::Store {
                status: status.as_u16(),
                message: store_message(&body),
            });
        }
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let rows = match serde_json::from_str::<Value>(&body)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            Value::Object(map) => vec![map],
            _ => Vec::new(),
        };
        Ok(rows)
    }
}

/// Pull the `message` field out of a PostgREST error body when there is one.
fn store_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

impl RecordStore for RestStore {
    fn select(&self, query: &SelectQuery) -> Result<Vec<RawRow>> {
        let select = query
            .columns
            .map(|cols| cols.join(","))
            .unwrap_or_else(|| "*".to_string());
        let mut params = vec![("select".to_string(), select)];
        if let Some(col) = query.order_by {
            params.push(("order".to_string(), format!("{col}.asc")));
        }
        debug!(target: "desk::store", table = query.table.name(), ?params, "select");
        let resp = self
            .authorized(self.client.get(self.endpoint(query.table)))
            .query(&params)
            .send()?;
        Self::read_rows(resp)
    }

    fn insert(&self, table: TicketTable, record: &RawRow) -> Result<Vec<RawRow>> {
        debug!(target: "desk::store", table = table.name(), "insert");
        let resp = self
            .authorized(self.client.post(self.endpoint(table)))
            .header("Prefer", "return=representation")
            .json(&[record])
            .send()?;
        Self::read_rows(resp)
    }

    fn update(
        &self,
        table: TicketTable,
        id_column: &str,
        id: i64,
        patch: &RawRow,
    ) -> Result<Vec<RawRow>> {
        debug!(target: "desk::store", table = table.name(), id, "update");
        let resp = self
            .authorized(self.client.patch(self.endpoint(table)))
            .query(&[(id_column, format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(patch)
            .send()?;
        Self::read_rows(resp)
    }
}
