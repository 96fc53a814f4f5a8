//! Row filters and their composition algebra
//!
//! Filters select which raw rows participate in a query, before any
//! aggregation happens. Filters compose with [`Filter::and`],
//! [`Filter::or`] and [`Filter::negate`]; combining two filters of the
//! same associative kind merges their child lists instead of nesting,
//! so `f1.and(f2).and(f3)` serializes as a single three-field `and`.
//! Negation is never simplified: `f.negate().negate()` stays two levels
//! deep on the wire.

use serde_json::{json, Map, Value};

use super::dimension::{DimensionRef, ExtractionFunction};
use super::error::{QueryError, QueryResult};

/// A filter predicate over raw rows
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Exact match on one dimension value
    Selector {
        dimension: String,
        value: Value,
        extraction_fn: Option<ExtractionFunction>,
    },
    /// Match on the extracted value of a dimension
    Extraction {
        dimension: String,
        value: Value,
        extraction_fn: ExtractionFunction,
    },
    /// Regex match on a dimension value
    Regex { dimension: String, pattern: String },
    /// Arbitrary JavaScript predicate over a dimension value
    Javascript { dimension: String, function: String },
    /// Membership in an explicit value list
    In { dimension: String, values: Vec<Value> },
    /// Range filter with optional open bounds
    Bound {
        dimension: String,
        lower: Option<String>,
        upper: Option<String>,
        lower_strict: bool,
        upper_strict: bool,
        alpha_numeric: bool,
        extraction_fn: Option<ExtractionFunction>,
    },
    /// Match rows whose dimension value falls in ISO-8601 intervals
    Interval {
        dimension: String,
        intervals: Vec<String>,
        extraction_fn: Option<ExtractionFunction>,
    },
    /// Match rows where two columns hold the same value
    ColumnComparison { dimensions: Vec<DimensionRef> },
    /// Conjunction over an ordered, non-empty field list
    And { fields: Vec<Filter> },
    /// Disjunction over an ordered, non-empty field list
    Or { fields: Vec<Filter> },
    /// Negation of exactly one child
    Not { field: Box<Filter> },
    /// A pre-built wire document, passed through untouched
    Raw(Value),
}

impl Filter {
    /// Exact-match filter on a dimension value
    pub fn selector(dimension: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Selector {
            dimension: dimension.into(),
            value: value.into(),
            extraction_fn: None,
        }
    }

    /// Match on the extracted value of a dimension
    pub fn extraction(
        dimension: impl Into<String>,
        value: impl Into<Value>,
        extraction_fn: ExtractionFunction,
    ) -> Self {
        Self::Extraction {
            dimension: dimension.into(),
            value: value.into(),
            extraction_fn,
        }
    }

    /// Regex filter on a dimension value
    pub fn regex(dimension: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Regex {
            dimension: dimension.into(),
            pattern: pattern.into(),
        }
    }

    /// JavaScript predicate filter
    pub fn javascript(dimension: impl Into<String>, function: impl Into<String>) -> Self {
        Self::Javascript {
            dimension: dimension.into(),
            function: function.into(),
        }
    }

    /// Membership filter over an explicit value list
    pub fn in_list(
        dimension: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        Self::In {
            dimension: dimension.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Start building a bound (range) filter
    pub fn bound(dimension: impl Into<String>) -> BoundBuilder {
        BoundBuilder::new(dimension)
    }

    /// Interval filter over ISO-8601 interval strings
    pub fn interval(
        dimension: impl Into<String>,
        intervals: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::Interval {
            dimension: dimension.into(),
            intervals: intervals.into_iter().map(Into::into).collect(),
            extraction_fn: None,
        }
    }

    /// Column-comparison filter over two or more dimension refs
    pub fn column_comparison(dimensions: impl IntoIterator<Item = DimensionRef>) -> Self {
        Self::ColumnComparison {
            dimensions: dimensions.into_iter().collect(),
        }
    }

    /// Wrap a pre-built wire document; it passes through serialization
    /// untouched.
    pub fn raw(document: Value) -> Self {
        Self::Raw(document)
    }

    /// Attach an extraction function to a filter variant that supports one.
    /// Variants without an `extractionFn` slot are returned unchanged.
    pub fn with_extraction(self, extraction: ExtractionFunction) -> Self {
        match self {
            Self::Selector {
                dimension, value, ..
            } => Self::Selector {
                dimension,
                value,
                extraction_fn: Some(extraction),
            },
            Self::Bound {
                dimension,
                lower,
                upper,
                lower_strict,
                upper_strict,
                alpha_numeric,
                ..
            } => Self::Bound {
                dimension,
                lower,
                upper,
                lower_strict,
                upper_strict,
                alpha_numeric,
                extraction_fn: Some(extraction),
            },
            Self::Interval {
                dimension,
                intervals,
                ..
            } => Self::Interval {
                dimension,
                intervals,
                extraction_fn: Some(extraction),
            },
            other => other,
        }
    }

    /// Conjunction. Merges `and` child lists rather than nesting them.
    pub fn and(self, other: Filter) -> Filter {
        match (self, other) {
            (Self::And { fields: mut left }, Self::And { fields: right }) => {
                left.extend(right);
                Self::And { fields: left }
            }
            (Self::And { mut fields }, other) => {
                fields.push(other);
                Self::And { fields }
            }
            (left, Self::And { fields: right }) => {
                let mut fields = vec![left];
                fields.extend(right);
                Self::And { fields }
            }
            (left, right) => Self::And {
                fields: vec![left, right],
            },
        }
    }

    /// Disjunction. Merges `or` child lists rather than nesting them.
    pub fn or(self, other: Filter) -> Filter {
        match (self, other) {
            (Self::Or { fields: mut left }, Self::Or { fields: right }) => {
                left.extend(right);
                Self::Or { fields: left }
            }
            (Self::Or { mut fields }, other) => {
                fields.push(other);
                Self::Or { fields }
            }
            (left, Self::Or { fields: right }) => {
                let mut fields = vec![left];
                fields.extend(right);
                Self::Or { fields }
            }
            (left, right) => Self::Or {
                fields: vec![left, right],
            },
        }
    }

    /// Negation. Double negation is preserved, not simplified.
    pub fn negate(self) -> Filter {
        Self::Not {
            field: Box::new(self),
        }
    }

    /// Lower to the wire document. Pure: repeated calls on the same
    /// filter yield independent, structurally identical documents.
    pub fn build(&self) -> Value {
        match self {
            Self::Selector {
                dimension,
                value,
                extraction_fn,
            } => {
                let mut doc = Map::new();
                doc.insert("type".into(), json!("selector"));
                doc.insert("dimension".into(), json!(dimension));
                doc.insert("value".into(), value.clone());
                if let Some(extraction_fn) = extraction_fn {
                    doc.insert("extractionFn".into(), extraction_fn.build());
                }
                Value::Object(doc)
            }
            Self::Extraction {
                dimension,
                value,
                extraction_fn,
            } => json!({
                "type": "extraction",
                "dimension": dimension,
                "value": value,
                "extractionFn": extraction_fn.build(),
            }),
            Self::Regex { dimension, pattern } => json!({
                "type": "regex",
                "dimension": dimension,
                "pattern": pattern,
            }),
            Self::Javascript {
                dimension,
                function,
            } => json!({
                "type": "javascript",
                "dimension": dimension,
                "function": function,
            }),
            Self::In { dimension, values } => json!({
                "type": "in",
                "dimension": dimension,
                "values": values,
            }),
            Self::Bound {
                dimension,
                lower,
                upper,
                lower_strict,
                upper_strict,
                alpha_numeric,
                extraction_fn,
            } => {
                let mut doc = Map::new();
                doc.insert("type".into(), json!("bound"));
                doc.insert("dimension".into(), json!(dimension));
                if let Some(lower) = lower {
                    doc.insert("lower".into(), json!(lower));
                }
                doc.insert("lowerStrict".into(), json!(lower_strict));
                if let Some(upper) = upper {
                    doc.insert("upper".into(), json!(upper));
                }
                doc.insert("upperStrict".into(), json!(upper_strict));
                doc.insert("alphaNumeric".into(), json!(alpha_numeric));
                if let Some(extraction_fn) = extraction_fn {
                    doc.insert("extractionFn".into(), extraction_fn.build());
                }
                Value::Object(doc)
            }
            Self::Interval {
                dimension,
                intervals,
                extraction_fn,
            } => {
                let mut doc = Map::new();
                doc.insert("type".into(), json!("interval"));
                doc.insert("dimension".into(), json!(dimension));
                doc.insert("intervals".into(), json!(intervals));
                if let Some(extraction_fn) = extraction_fn {
                    doc.insert("extractionFn".into(), extraction_fn.build());
                }
                Value::Object(doc)
            }
            Self::ColumnComparison { dimensions } => json!({
                "type": "columnComparison",
                "dimensions": dimensions.iter().map(DimensionRef::build).collect::<Vec<_>>(),
            }),
            Self::And { fields } => json!({
                "type": "and",
                "fields": fields.iter().map(Filter::build).collect::<Vec<_>>(),
            }),
            Self::Or { fields } => json!({
                "type": "or",
                "fields": fields.iter().map(Filter::build).collect::<Vec<_>>(),
            }),
            Self::Not { field } => json!({
                "type": "not",
                "field": field.build(),
            }),
            Self::Raw(document) => document.clone(),
        }
    }

    /// Parse a caller-supplied raw document into a typed filter.
    ///
    /// This is the only place an unrecognized `type` tag can surface at
    /// runtime; filters built through the typed constructors cannot carry
    /// one. A document with no `type` tag is treated as a selector.
    pub fn from_spec(spec: &Value) -> QueryResult<Filter> {
        const FAMILY: &str = "filter";

        let type_tag = spec
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("selector")
            .to_string();

        let require = |field: &'static str| -> QueryResult<&Value> {
            spec.get(field).ok_or(QueryError::MissingField {
                family: FAMILY,
                type_tag: type_tag.clone(),
                field,
            })
        };
        let require_str = |field: &'static str| -> QueryResult<String> {
            require(field).map(|v| v.as_str().unwrap_or_default().to_string())
        };

        match type_tag.as_str() {
            "selector" => Ok(Filter::selector(require_str("dimension")?, require("value")?.clone())),
            "regex" => Ok(Filter::regex(require_str("dimension")?, require_str("pattern")?)),
            "javascript" => Ok(Filter::javascript(
                require_str("dimension")?,
                require_str("function")?,
            )),
            "in" => {
                let values = require("values")?
                    .as_array()
                    .cloned()
                    .unwrap_or_default();
                Ok(Filter::In {
                    dimension: require_str("dimension")?,
                    values,
                })
            }
            // bound, interval, extraction and columnComparison documents
            // keep their exact shape; re-parsing their optional pieces
            // would add nothing, so they pass through as raw nodes.
            "bound" | "interval" | "extraction" | "columnComparison" => {
                require("dimension").or_else(|e| {
                    if type_tag == "columnComparison" {
                        require("dimensions").map_err(|_| e)
                    } else {
                        Err(e)
                    }
                })?;
                Ok(Filter::Raw(spec.clone()))
            }
            "and" | "or" => {
                let fields = require("fields")?
                    .as_array()
                    .map(|fields| fields.iter().map(Filter::from_spec).collect())
                    .transpose()?
                    .unwrap_or_default();
                if type_tag == "and" {
                    Ok(Filter::And { fields })
                } else {
                    Ok(Filter::Or { fields })
                }
            }
            "not" => Ok(Filter::Not {
                field: Box::new(Filter::from_spec(require("field")?)?),
            }),
            other => Err(QueryError::UnrecognizedVariant {
                family: FAMILY,
                type_tag: other.to_string(),
            }),
        }
    }
}

/// Builder for [`Filter::Bound`]
#[derive(Debug, Clone)]
pub struct BoundBuilder {
    dimension: String,
    lower: Option<String>,
    upper: Option<String>,
    lower_strict: bool,
    upper_strict: bool,
    alpha_numeric: bool,
    extraction_fn: Option<ExtractionFunction>,
}

impl BoundBuilder {
    fn new(dimension: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            lower: None,
            upper: None,
            lower_strict: false,
            upper_strict: false,
            alpha_numeric: false,
            extraction_fn: None,
        }
    }

    pub fn lower(mut self, lower: impl Into<String>) -> Self {
        self.lower = Some(lower.into());
        self
    }

    pub fn upper(mut self, upper: impl Into<String>) -> Self {
        self.upper = Some(upper.into());
        self
    }

    pub fn lower_strict(mut self, strict: bool) -> Self {
        self.lower_strict = strict;
        self
    }

    pub fn upper_strict(mut self, strict: bool) -> Self {
        self.upper_strict = strict;
        self
    }

    pub fn alpha_numeric(mut self, alpha_numeric: bool) -> Self {
        self.alpha_numeric = alpha_numeric;
        self
    }

    pub fn extraction(mut self, extraction_fn: ExtractionFunction) -> Self {
        self.extraction_fn = Some(extraction_fn);
        self
    }

    pub fn build(self) -> Filter {
        Filter::Bound {
            dimension: self.dimension,
            lower: self.lower,
            upper: self.upper,
            lower_strict: self.lower_strict,
            upper_strict: self.upper_strict,
            alpha_numeric: self.alpha_numeric,
            extraction_fn: self.extraction_fn,
        }
    }
}

/// Sugar for equality filters on a dimension
///
/// `Dimension::new("user_lang").is("en")` builds a selector filter;
/// `is_not` wraps the selector in a negation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension(String);

impl Dimension {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Equality: lowers to a selector filter
    pub fn is(&self, value: impl Into<Value>) -> Filter {
        Filter::selector(self.0.clone(), value)
    }

    /// Inequality: lowers to a negated selector filter
    pub fn is_not(&self, value: impl Into<Value>) -> Filter {
        self.is(value).negate()
    }
}
