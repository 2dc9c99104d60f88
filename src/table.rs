use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;

use crate::error::RegError;

/// REST surface of the table backend. One named table per record track;
/// rows travel as flat JSON objects.
pub trait TableClient: Send + Sync {
    /// One page of rows. Pages are 1-based; past the end the backend
    /// returns an empty page.
    fn list(&self, table: &str, page: usize, limit: usize) -> Result<Vec<Value>, RegError>;
    fn get(&self, table: &str, id: &str) -> Result<Value, RegError>;
    fn create(&self, table: &str, row: &Value) -> Result<Value, RegError>;
    fn update(&self, table: &str, id: &str, row: &Value) -> Result<Value, RegError>;
    fn patch(&self, table: &str, id: &str, fields: &Value) -> Result<Value, RegError>;
    fn delete(&self, table: &str, id: &str) -> Result<(), RegError>;
}

/// List responses come in two shapes depending on backend version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListResponse {
    Wrapped { data: Vec<Value> },
    Bare(Vec<Value>),
}

impl ListResponse {
    fn into_rows(self) -> Vec<Value> {
        match self {
            ListResponse::Wrapped { data } => data,
            ListResponse::Bare(rows) => rows,
        }
    }
}

#[derive(Clone)]
pub struct TableHttpClient {
    client: Client,
    base_url: String,
}

impl TableHttpClient {
    pub fn new(base_url: &str) -> Result<Self, RegError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("regsync/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| RegError::TableHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| RegError::TableHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/tables/{}", self.base_url, table)
    }

    fn record_url(&self, table: &str, id: &str) -> String {
        format!("{}/tables/{}/{}", self.base_url, table, id)
    }

    fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, RegError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "table request failed".to_string());
        Err(RegError::TableStatus { status, message })
    }

    fn read_json(response: reqwest::blocking::Response) -> Result<Value, RegError> {
        let response = Self::check_status(response)?;
        response
            .json()
            .map_err(|err| RegError::UnexpectedResponse(err.to_string()))
    }
}

impl TableClient for TableHttpClient {
    fn list(&self, table: &str, page: usize, limit: usize) -> Result<Vec<Value>, RegError> {
        let response = self
            .client
            .get(self.table_url(table))
            .query(&[("page", page.to_string()), ("limit", limit.to_string())])
            .send()
            .map_err(|err| RegError::TableHttp(err.to_string()))?;
        let response = Self::check_status(response)?;
        let parsed: ListResponse = response
            .json()
            .map_err(|err| RegError::UnexpectedResponse(err.to_string()))?;
        Ok(parsed.into_rows())
    }

    fn get(&self, table: &str, id: &str) -> Result<Value, RegError> {
        let response = self
            .client
            .get(self.record_url(table, id))
            .send()
            .map_err(|err| RegError::TableHttp(err.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RegError::RecordNotFound {
                table: table.to_string(),
                id: id.to_string(),
            });
        }
        Self::read_json(response)
    }

    fn create(&self, table: &str, row: &Value) -> Result<Value, RegError> {
        let response = self
            .client
            .post(self.table_url(table))
            .json(row)
            .send()
            .map_err(|err| RegError::TableHttp(err.to_string()))?;
        Self::read_json(response)
    }

    fn update(&self, table: &str, id: &str, row: &Value) -> Result<Value, RegError> {
        let response = self
            .client
            .put(self.record_url(table, id))
            .json(row)
            .send()
            .map_err(|err| RegError::TableHttp(err.to_string()))?;
        Self::read_json(response)
    }

    fn patch(&self, table: &str, id: &str, fields: &Value) -> Result<Value, RegError> {
        let response = self
            .client
            .patch(self.record_url(table, id))
            .json(fields)
            .send()
            .map_err(|err| RegError::TableHttp(err.to_string()))?;
        Self::read_json(response)
    }

    fn delete(&self, table: &str, id: &str) -> Result<(), RegError> {
        let response = self
            .client
            .delete(self.record_url(table, id))
            .send()
            .map_err(|err| RegError::TableHttp(err.to_string()))?;
        // deleting an already-deleted record is a success
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check_status(response)?;
        Ok(())
    }
}
