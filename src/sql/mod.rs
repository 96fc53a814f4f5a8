//! SQL-over-HTTP Client
//!
//! A thin client for the engine's SQL endpoint:
//!
//! - **Params**: named `%(key)s` placeholder binding, dynamic (positional
//!   markers plus typed records) or static (inlined quoted literals)
//! - **Chunks**: incremental row reconstruction from a streamed JSON body
//! - **Cursor**: the async HTTP client tying the two together
//!
//! # Examples
//!
//! ```rust,no_run
//! use menhir::sql::SqlClient;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), menhir::sql::SqlError> {
//! let client = SqlClient::new(reqwest::Client::new(), "http://localhost:8082/druid/v2/sql/");
//! let rows = client
//!     .execute(
//!         "SELECT __time, page FROM wikipedia WHERE countryName = %(country)s",
//!         &[("country".to_string(), json!("France"))],
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod chunks;
mod cursor;
mod error;
mod params;

pub use chunks::{rows_from_chunks, ChunkParser, Row, RowsFromChunks};
pub use cursor::SqlClient;
pub use error::{SqlError, SqlResult};
pub use params::{apply_dynamic, apply_static, ParamType, SqlParam};
