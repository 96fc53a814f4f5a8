//! Native query HTTP client
//!
//! Assembles a query document, POSTs it to the engine's native endpoint
//! and decodes the JSON body. The most recent document and result are
//! kept on the client for diagnostics and export.

use serde_json::Value;
use tracing::{debug, warn};

use crate::query::{assemble, QueryComponents, QueryType};

use super::error::{ClientError, ClientResult};
use super::extract_error_message;

/// Client for the native query endpoint
///
/// ```rust,no_run
/// use menhir::client::NativeClient;
/// use menhir::query::{Aggregator, Dimension, QueryComponents, QueryType};
///
/// # async fn run() -> Result<(), menhir::client::ClientError> {
/// let mut client = NativeClient::new(reqwest::Client::new(), "http://localhost:8082");
/// let result = client
///     .topn(
///         QueryComponents::new()
///             .datasource("twitterstream")
///             .granularity("all")
///             .intervals("2013-10-04/pt1h")
///             .aggregations(vec![("count", Aggregator::double_sum("count"))])
///             .dimension("user_name")
///             .filter(Dimension::new("user_lang").is("en"))
///             .metric("count")
///             .threshold(2),
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct NativeClient {
    http: reqwest::Client,
    url: String,
    last_query: Option<Value>,
    last_query_type: Option<QueryType>,
    last_result: Option<Vec<Value>>,
}

impl NativeClient {
    /// `base_url` is the broker root, e.g. `http://localhost:8082`; the
    /// native endpoint `druid/v2/` is appended.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        Self {
            http,
            url: format!("{}/druid/v2/", base.trim_end_matches('/')),
            last_query: None,
            last_query_type: None,
            last_result: None,
        }
    }

    /// Override the native endpoint path with a full URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// The most recent assembled query document
    pub fn last_query(&self) -> Option<&Value> {
        self.last_query.as_ref()
    }

    pub fn last_query_type(&self) -> Option<QueryType> {
        self.last_query_type
    }

    /// The most recent decoded result
    pub fn last_result(&self) -> Option<&[Value]> {
        self.last_result.as_deref()
    }

    pub async fn topn(&mut self, components: QueryComponents) -> ClientResult<Vec<Value>> {
        self.execute(QueryType::TopN, components).await
    }

    pub async fn timeseries(&mut self, components: QueryComponents) -> ClientResult<Vec<Value>> {
        self.execute(QueryType::Timeseries, components).await
    }

    pub async fn groupby(&mut self, components: QueryComponents) -> ClientResult<Vec<Value>> {
        self.execute(QueryType::GroupBy, components).await
    }

    pub async fn segment_metadata(
        &mut self,
        components: QueryComponents,
    ) -> ClientResult<Vec<Value>> {
        self.execute(QueryType::SegmentMetadata, components).await
    }

    pub async fn time_boundary(
        &mut self,
        components: QueryComponents,
    ) -> ClientResult<Vec<Value>> {
        self.execute(QueryType::TimeBoundary, components).await
    }

    pub async fn select(&mut self, components: QueryComponents) -> ClientResult<Vec<Value>> {
        self.execute(QueryType::Select, components).await
    }

    /// Validate, assemble, POST and decode one query
    pub async fn execute(
        &mut self,
        query_type: QueryType,
        components: QueryComponents,
    ) -> ClientResult<Vec<Value>> {
        let doc = assemble(query_type, &components)?;
        self.last_query = Some(doc.clone());
        self.last_query_type = Some(query_type);
        self.last_result = None;

        debug!(url = %self.url, query_type = %query_type, "posting native query");
        let response = self.http.post(&self.url).json(&doc).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = extract_error_message(&text);
            warn!(status = status.as_u16(), %message, "native query failed");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
                query: Box::new(doc),
            });
        }

        let result: Vec<Value> = response.json().await?;
        debug!(items = result.len(), "native query complete");
        self.last_result = Some(result.clone());
        Ok(result)
    }

    /// Export the most recent result as tab-separated values
    pub fn export_tsv<W: std::io::Write>(&self, writer: W) -> ClientResult<()> {
        let query_type = self.last_query_type.ok_or(ClientError::NoResult)?;
        let result = self.last_result.as_deref().ok_or(ClientError::NoResult)?;
        super::export::export_tsv(query_type, result, writer)
    }

    /// Flatten the most recent result into row objects
    pub fn to_rows(&self) -> ClientResult<Vec<serde_json::Map<String, Value>>> {
        let query_type = self.last_query_type.ok_or(ClientError::NoResult)?;
        let result = self.last_result.as_deref().ok_or(ClientError::NoResult)?;
        super::export::to_rows(query_type, result)
    }
}
