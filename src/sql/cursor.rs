//! SQL-over-HTTP client
//!
//! Posts a statement to the engine's SQL endpoint and streams the
//! response body through [`ChunkParser`](super::chunks::ChunkParser),
//! so rows decode as they arrive rather than after the full body.

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::client::extract_error_message;

use super::chunks::{ChunkParser, Row};
use super::error::{SqlError, SqlResult};
use super::params::{apply_dynamic, apply_static, SqlParam};

/// Client for the SQL query endpoint
#[derive(Debug, Clone)]
pub struct SqlClient {
    http: reqwest::Client,
    url: String,
    username: Option<String>,
    password: Option<String>,
    context: Value,
    header: bool,
}

impl SqlClient {
    /// `url` is the full SQL endpoint, e.g. `http://localhost:8082/druid/v2/sql/`
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            username: None,
            password: None,
            context: json!({}),
            header: false,
        }
    }

    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Context settings sent with every statement (timeout, sqlTimeZone, ...)
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Execute a statement with named parameters bound server-side.
    ///
    /// `%(key)s` placeholders are rewritten to positional markers and the
    /// values travel as typed records in the request body.
    pub async fn execute(
        &self,
        sql: &str,
        params: &[(String, Value)],
    ) -> SqlResult<Vec<Row>> {
        let (query, records) = apply_dynamic(sql, params)?;
        let body = request_body(&query, &self.context, self.header, records.as_deref());
        self.post(sql, &body).await
    }

    /// Execute a statement with parameters inlined as quoted literals
    pub async fn execute_static(
        &self,
        sql: &str,
        params: &[(String, Value)],
    ) -> SqlResult<Vec<Row>> {
        let query = apply_static(sql, params)?;
        let body = request_body(&query, &self.context, self.header, None);
        self.post(sql, &body).await
    }

    async fn post(&self, sql: &str, body: &Value) -> SqlResult<Vec<Row>> {
        debug!(url = %self.url, "posting SQL query");
        let mut request = self.http.post(&self.url).json(body);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }
        let mut response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = extract_error_message(&text);
            warn!(status = status.as_u16(), %message, "SQL query failed");
            return Err(SqlError::Http {
                status: status.as_u16(),
                message,
                query: sql.to_string(),
            });
        }

        let mut parser = ChunkParser::new();
        let mut rows = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            rows.extend(parser.push_bytes(&chunk)?);
        }
        parser.finish()?;
        debug!(rows = rows.len(), "SQL query complete");
        Ok(rows)
    }
}

fn request_body(query: &str, context: &Value, header: bool, params: Option<&[SqlParam]>) -> Value {
    let mut body = json!({
        "query": query,
        "context": context,
        "header": header,
    });
    if let Some(params) = params {
        body["parameters"] = serde_json::to_value(params).unwrap_or(Value::Null);
    }
    body
}
