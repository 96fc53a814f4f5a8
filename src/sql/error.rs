//! SQL client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqlError {
    /// Placeholder keys in the statement and supplied parameter keys
    /// are not the same set
    #[error("Parameters and placeholders do not match")]
    ParameterMismatch,

    /// The response stream ended in the middle of a row
    #[error("Response stream ended inside an unterminated row")]
    MalformedStream,

    /// The response stream contained bytes that are not valid UTF-8
    #[error("Response stream is not valid UTF-8")]
    InvalidUtf8,

    #[error("Query failed with status {status}: {message}")]
    Http {
        status: u16,
        message: String,
        query: String,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode row: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type SqlResult<T> = Result<T, SqlError>;
