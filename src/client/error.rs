//! Native client error types

use serde_json::Value;
use thiserror::Error;

use crate::query::QueryError;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The query document could not be built
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The engine rejected the query; carries the outgoing document for
    /// diagnostics
    #[error("Query failed with status {status}: {message}")]
    Api {
        status: u16,
        message: String,
        query: Box<Value>,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// No result is held, or the held result's shape does not match the
    /// query type
    #[error("No result available to export")]
    NoResult,

    #[error("Export not implemented for query type: {0}")]
    UnsupportedExport(String),

    #[error("Export failed: {0}")]
    Export(#[from] csv::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
