//! Query construction error types
//!
//! Defines all error conditions that can occur while building and
//! assembling query documents.

use thiserror::Error;

/// Errors that can occur during query construction
#[derive(Error, Debug)]
pub enum QueryError {
    /// A raw document carried a `type` tag outside the recognized set
    #[error("Unrecognized {family} type: {type_tag}")]
    UnrecognizedVariant {
        /// Node family the document was parsed as (e.g. "filter")
        family: &'static str,
        /// The offending `type` tag
        type_tag: String,
    },

    /// A raw document was missing a field its `type` tag requires
    #[error("Missing field {field} for {family} type: {type_tag}")]
    MissingField {
        family: &'static str,
        type_tag: String,
        field: &'static str,
    },

    /// A query component is not valid for the requested query type
    #[error(
        "Query component: {component} is not valid for query type: {query_type}. \
         The list of valid components is: {valid:?}"
    )]
    UnrecognizedComponent {
        component: String,
        query_type: String,
        valid: Vec<&'static str>,
    },
}

/// Result type for query construction
pub type QueryResult<T> = Result<T, QueryError>;
