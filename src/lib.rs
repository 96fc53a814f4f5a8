//! # Menhir
//!
//! A Rust client for Druid-style analytics databases: composable native
//! query construction, SQL-over-HTTP with parameter binding, and
//! streaming result parsing.
//!
//! ## Features
//!
//! - **Composable queries**: filters, aggregators, post-aggregators and
//!   having clauses combine through a small algebra into one JSON document
//! - **Validated assembly**: component keys are checked against the
//!   recognized set for each query type before anything goes on the wire
//! - **SQL binding**: named `%(key)s` placeholders, bound server-side as
//!   typed parameters or inlined as quoted literals
//! - **Streaming rows**: SQL results decode row-by-row as chunks arrive
//! - **TSV export**: flatten timeseries/topN/groupBy results to tables
//!
//! ## Modules
//!
//! - [`query`]: expression families and query document assembly
//! - [`client`]: async native query client and export
//! - [`sql`]: SQL-over-HTTP client, parameter binding, chunk parser
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use menhir::{Aggregator, Dimension, NativeClient, QueryComponents};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = menhir::Config::load_default();
//!     let mut client = NativeClient::new(config.http_client()?, &config.broker.url);
//!
//!     let result = client
//!         .topn(
//!             QueryComponents::new()
//!                 .datasource("twitterstream")
//!                 .granularity("all")
//!                 .intervals("2013-10-04/pt1h")
//!                 .aggregations(vec![("count", Aggregator::double_sum("count"))])
//!                 .dimension("user_name")
//!                 .filter(Dimension::new("user_lang").is("en"))
//!                 .metric("count")
//!                 .threshold(2),
//!         )
//!         .await?;
//!
//!     println!("Found {} buckets", result.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod query;
pub mod sql;

// Re-export top-level types for convenience
pub use client::{ClientError, ClientResult, NativeClient};

pub use config::{init_logging, Config, ConfigError};

pub use query::{
    assemble, interval, Aggregation, Aggregator, DataSource, Dimension, DimensionSpec,
    ExtractionFunction, Filter, Having, Join, PostAggregator, QueryComponents, QueryError,
    QueryResult, QueryType, VirtualColumn,
};

pub use sql::{rows_from_chunks, SqlClient, SqlError, SqlResult};
