//! Native Query Construction
//!
//! Builds the JSON documents the engine's native query endpoint accepts:
//!
//! - **Filters**: row predicates with a composable and/or/not algebra
//! - **Aggregators**: per-metric aggregations, including filtered wrappers
//! - **Post-aggregators**: arithmetic and sketch operations over aggregates
//! - **Having**: predicates over grouped results
//! - **Dimensions**: dimension specs with extraction and filtering
//! - **Document**: component validation and final query assembly
//!
//! # Examples
//!
//! ```rust
//! use menhir::query::{assemble, Aggregator, Dimension, QueryComponents, QueryType};
//!
//! let components = QueryComponents::new()
//!     .datasource("twitterstream")
//!     .granularity("all")
//!     .intervals("2013-10-04/pt1h")
//!     .aggregations(vec![("count", Aggregator::double_sum("count"))])
//!     .dimension("user_name")
//!     .filter(Dimension::new("user_lang").is("en"))
//!     .metric("count")
//!     .threshold(2);
//!
//! let doc = assemble(QueryType::TopN, &components)?;
//! # Ok::<(), menhir::query::QueryError>(())
//! ```

mod aggregator;
mod dimension;
mod document;
mod error;
mod filter;
mod having;
mod join;
mod postaggregator;
mod virtual_column;

pub use aggregator::{build_aggregators, Aggregator};
pub use dimension::{DimensionRef, DimensionSpec, ExtractionFunction, FilterSpec};
pub use document::{
    assemble, interval, Component, DataSource, QueryComponents, QueryType,
};
pub use error::{QueryError, QueryResult};
pub use filter::{BoundBuilder, Dimension, Filter};
pub use having::{Aggregation, Having};
pub use join::{Join, JoinType};
pub use postaggregator::{build_post_aggregators, ArithmeticOp, PostAggregator, SketchOp};
pub use virtual_column::VirtualColumn;
