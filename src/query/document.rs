//! Query document assembly
//!
//! Combines named maps of aggregators, post-aggregators, filters and
//! having clauses with scalar parameters into the single nested JSON
//! document the engine accepts. Component keys are validated against the
//! recognized set for the requested query type before anything is
//! serialized.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use super::aggregator::{build_aggregators, Aggregator};
use super::dimension::DimensionRef;
use super::error::{QueryError, QueryResult};
use super::filter::Filter;
use super::having::Having;
use super::join::Join;
use super::postaggregator::{build_post_aggregators, PostAggregator};
use super::virtual_column::VirtualColumn;

/// The native query kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    TopN,
    Timeseries,
    GroupBy,
    SegmentMetadata,
    TimeBoundary,
    Select,
}

impl QueryType {
    /// The `queryType` tag used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopN => "topN",
            Self::Timeseries => "timeseries",
            Self::GroupBy => "groupBy",
            Self::SegmentMetadata => "segmentMetadata",
            Self::TimeBoundary => "timeBoundary",
            Self::Select => "select",
        }
    }

    /// Component keys recognized for this query type. `context` is
    /// always additionally accepted.
    pub fn valid_components(&self) -> &'static [&'static str] {
        match self {
            Self::TopN => &[
                "datasource",
                "granularity",
                "filter",
                "aggregations",
                "post_aggregations",
                "intervals",
                "dimension",
                "threshold",
                "metric",
                "virtual_columns",
            ],
            Self::Timeseries => &[
                "datasource",
                "granularity",
                "filter",
                "aggregations",
                "post_aggregations",
                "intervals",
                "virtual_columns",
            ],
            Self::GroupBy => &[
                "datasource",
                "granularity",
                "filter",
                "aggregations",
                "having",
                "post_aggregations",
                "intervals",
                "dimensions",
                "limit_spec",
                "virtual_columns",
            ],
            Self::SegmentMetadata => &["datasource", "intervals"],
            Self::TimeBoundary => &["datasource"],
            Self::Select => &[
                "datasource",
                "granularity",
                "filter",
                "dimensions",
                "metrics",
                "paging_spec",
                "intervals",
                "virtual_columns",
            ],
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a query reads from: a plain table or a join
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Table(String),
    Join(Join),
}

impl DataSource {
    pub fn build(&self) -> Value {
        match self {
            Self::Table(name) => json!(name),
            Self::Join(join) => join.build(),
        }
    }
}

impl From<&str> for DataSource {
    fn from(name: &str) -> Self {
        Self::Table(name.to_string())
    }
}

impl From<String> for DataSource {
    fn from(name: String) -> Self {
        Self::Table(name)
    }
}

impl From<Join> for DataSource {
    fn from(join: Join) -> Self {
        Self::Join(join)
    }
}

/// One typed query component
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    /// A literal value passed through unchanged
    Value(Value),
    DataSource(DataSource),
    Aggregations(Vec<(String, Aggregator)>),
    PostAggregations(Vec<(String, PostAggregator)>),
    Filter(Filter),
    Having(Having),
    Dimension(DimensionRef),
    Dimensions(Vec<DimensionRef>),
    VirtualColumns(Vec<VirtualColumn>),
}

/// Ordered collection of named query components
///
/// Built fluently, then validated and lowered by [`assemble`]:
///
/// ```rust
/// use menhir::query::{assemble, Aggregator, Dimension, QueryComponents, QueryType};
///
/// let components = QueryComponents::new()
///     .datasource("twitterstream")
///     .granularity("all")
///     .intervals("2013-10-04/pt1h")
///     .aggregations(vec![("count", Aggregator::double_sum("count"))])
///     .dimension("user_name")
///     .filter(Dimension::new("user_lang").is("en"))
///     .metric("count")
///     .threshold(2);
///
/// let doc = assemble(QueryType::TopN, &components).unwrap();
/// assert_eq!(doc["queryType"], "topN");
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryComponents {
    parts: Vec<(String, Component)>,
}

impl QueryComponents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a component, replacing any previous entry under the key
    pub fn set(mut self, key: impl Into<String>, component: Component) -> Self {
        let key = key.into();
        if let Some(existing) = self.parts.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = component;
        } else {
            self.parts.push((key, component));
        }
        self
    }

    /// Insert a raw key/value pair; the key is still validated
    pub fn raw(self, key: impl Into<String>, value: Value) -> Self {
        self.set(key, Component::Value(value))
    }

    pub fn datasource(self, datasource: impl Into<DataSource>) -> Self {
        self.set("datasource", Component::DataSource(datasource.into()))
    }

    pub fn granularity(self, granularity: impl Into<String>) -> Self {
        self.raw("granularity", json!(granularity.into()))
    }

    /// One interval string or a list of them
    pub fn intervals(self, intervals: impl Into<Value>) -> Self {
        self.raw("intervals", intervals.into())
    }

    pub fn aggregations(
        self,
        aggregations: Vec<(impl Into<String>, Aggregator)>,
    ) -> Self {
        self.set(
            "aggregations",
            Component::Aggregations(
                aggregations
                    .into_iter()
                    .map(|(name, agg)| (name.into(), agg))
                    .collect(),
            ),
        )
    }

    pub fn post_aggregations(
        self,
        post_aggregations: Vec<(impl Into<String>, PostAggregator)>,
    ) -> Self {
        self.set(
            "post_aggregations",
            Component::PostAggregations(
                post_aggregations
                    .into_iter()
                    .map(|(name, pagg)| (name.into(), pagg))
                    .collect(),
            ),
        )
    }

    pub fn filter(self, filter: Filter) -> Self {
        self.set("filter", Component::Filter(filter))
    }

    pub fn having(self, having: Having) -> Self {
        self.set("having", Component::Having(having))
    }

    pub fn dimension(self, dimension: impl Into<DimensionRef>) -> Self {
        self.set("dimension", Component::Dimension(dimension.into()))
    }

    pub fn dimensions(self, dimensions: Vec<impl Into<DimensionRef>>) -> Self {
        self.set(
            "dimensions",
            Component::Dimensions(dimensions.into_iter().map(Into::into).collect()),
        )
    }

    pub fn metric(self, metric: impl Into<String>) -> Self {
        self.raw("metric", json!(metric.into()))
    }

    pub fn metrics(self, metrics: Vec<impl Into<String>>) -> Self {
        self.raw(
            "metrics",
            json!(metrics.into_iter().map(Into::into).collect::<Vec<String>>()),
        )
    }

    pub fn threshold(self, threshold: u64) -> Self {
        self.raw("threshold", json!(threshold))
    }

    pub fn limit_spec(self, limit_spec: Value) -> Self {
        self.raw("limit_spec", limit_spec)
    }

    pub fn paging_spec(self, paging_spec: Value) -> Self {
        self.raw("paging_spec", paging_spec)
    }

    pub fn virtual_columns(self, virtual_columns: Vec<VirtualColumn>) -> Self {
        self.set("virtual_columns", Component::VirtualColumns(virtual_columns))
    }

    /// Arbitrary query context settings (timeout, priority, ...);
    /// accepted for every query type.
    pub fn context(self, context: Value) -> Self {
        self.raw("context", context)
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub(crate) fn parts(&self) -> &[(String, Component)] {
        &self.parts
    }
}

/// Validate components against the query type and lower everything into
/// one wire document.
///
/// Validation runs first: an unrecognized key aborts assembly before any
/// serialization happens.
pub fn assemble(query_type: QueryType, components: &QueryComponents) -> QueryResult<Value> {
    let valid = query_type.valid_components();
    for (key, _) in components.parts() {
        if key != "context" && !valid.contains(&key.as_str()) {
            return Err(QueryError::UnrecognizedComponent {
                component: key.clone(),
                query_type: query_type.as_str().to_string(),
                valid: valid.to_vec(),
            });
        }
    }

    let mut doc = Map::new();
    doc.insert("queryType".into(), json!(query_type.as_str()));

    for (key, component) in components.parts() {
        let (wire_key, value) = match component {
            Component::DataSource(datasource) => ("dataSource".to_string(), datasource.build()),
            Component::Aggregations(aggregations) => (
                "aggregations".to_string(),
                Value::Array(build_aggregators(aggregations)),
            ),
            Component::PostAggregations(post_aggregations) => (
                "postAggregations".to_string(),
                Value::Array(build_post_aggregators(post_aggregations)),
            ),
            Component::Filter(filter) => ("filter".to_string(), filter.build()),
            Component::Having(having) => ("having".to_string(), having.build()),
            Component::Dimension(dimension) => ("dimension".to_string(), dimension.build()),
            Component::Dimensions(dimensions) => (
                "dimensions".to_string(),
                Value::Array(dimensions.iter().map(DimensionRef::build).collect()),
            ),
            Component::VirtualColumns(virtual_columns) => (
                "virtualColumns".to_string(),
                Value::Array(virtual_columns.iter().map(VirtualColumn::build).collect()),
            ),
            Component::Value(value) => (wire_key_for(key), value.clone()),
        };
        doc.insert(wire_key, value);
    }

    Ok(Value::Object(doc))
}

/// Snake-case component keys that translate to camelCase on the wire
fn wire_key_for(key: &str) -> String {
    match key {
        "datasource" => "dataSource".to_string(),
        "post_aggregations" => "postAggregations".to_string(),
        "limit_spec" => "limitSpec".to_string(),
        "paging_spec" => "pagingSpec".to_string(),
        "virtual_columns" => "virtualColumns".to_string(),
        other => other.to_string(),
    }
}

/// Format an ISO-8601 interval string (`start/end`) from two instants
pub fn interval(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        "{}/{}",
        start.to_rfc3339_opts(SecondsFormat::Millis, true),
        end.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}
