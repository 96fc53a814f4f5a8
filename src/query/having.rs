//! Having clauses
//!
//! A having clause filters aggregated group results, after grouping,
//! unlike [`Filter`](super::filter::Filter) which applies to raw rows.
//! The wire schema uses `havingSpecs`/`havingSpec` for composite
//! children, and unlike the filter algebra, `and`/`or` here do NOT
//! flatten: each combination nests the previous composite as a child.

use serde_json::{json, Value};

use super::filter::Filter;

/// A predicate over aggregated group results
#[derive(Debug, Clone, PartialEq)]
pub enum Having {
    /// Aggregated value equals the given value
    EqualTo { aggregation: String, value: Value },
    /// Aggregated value is strictly less than the given value
    LessThan { aggregation: String, value: Value },
    /// Aggregated value is strictly greater than the given value
    GreaterThan { aggregation: String, value: Value },
    /// Group's dimension value equals the given value
    DimSelector { dimension: String, value: Value },
    /// Wrap a row filter as a having clause
    Filter { filter: Filter },
    And { having_specs: Vec<Having> },
    Or { having_specs: Vec<Having> },
    Not { having_spec: Box<Having> },
    /// A pre-built wire document, passed through untouched
    Raw(Value),
}

impl Having {
    pub fn equal_to(aggregation: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::EqualTo {
            aggregation: aggregation.into(),
            value: value.into(),
        }
    }

    pub fn less_than(aggregation: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::LessThan {
            aggregation: aggregation.into(),
            value: value.into(),
        }
    }

    pub fn greater_than(aggregation: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::GreaterThan {
            aggregation: aggregation.into(),
            value: value.into(),
        }
    }

    pub fn dim_selector(dimension: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::DimSelector {
            dimension: dimension.into(),
            value: value.into(),
        }
    }

    /// Wrap a row filter as a having clause
    pub fn filter(filter: Filter) -> Self {
        Self::Filter { filter }
    }

    pub fn raw(document: Value) -> Self {
        Self::Raw(document)
    }

    /// Conjunction. Deliberately does not flatten: `a.and(b).and(c)`
    /// nests the `a AND b` node as one child of the outer `and`.
    pub fn and(self, other: Having) -> Having {
        Self::And {
            having_specs: vec![self, other],
        }
    }

    /// Disjunction. Does not flatten, mirroring [`Having::and`].
    pub fn or(self, other: Having) -> Having {
        Self::Or {
            having_specs: vec![self, other],
        }
    }

    /// Negation
    pub fn negate(self) -> Having {
        Self::Not {
            having_spec: Box::new(self),
        }
    }

    /// Lower to the wire document
    pub fn build(&self) -> Value {
        match self {
            Self::EqualTo { aggregation, value } => json!({
                "type": "equalTo",
                "aggregation": aggregation,
                "value": value,
            }),
            Self::LessThan { aggregation, value } => json!({
                "type": "lessThan",
                "aggregation": aggregation,
                "value": value,
            }),
            Self::GreaterThan { aggregation, value } => json!({
                "type": "greaterThan",
                "aggregation": aggregation,
                "value": value,
            }),
            Self::DimSelector { dimension, value } => json!({
                "type": "dimSelector",
                "dimension": dimension,
                "value": value,
            }),
            Self::Filter { filter } => json!({
                "type": "filter",
                "filter": filter.build(),
            }),
            Self::And { having_specs } => json!({
                "type": "and",
                "havingSpecs": having_specs.iter().map(Having::build).collect::<Vec<_>>(),
            }),
            Self::Or { having_specs } => json!({
                "type": "or",
                "havingSpecs": having_specs.iter().map(Having::build).collect::<Vec<_>>(),
            }),
            Self::Not { having_spec } => json!({
                "type": "not",
                "havingSpec": having_spec.build(),
            }),
            Self::Raw(document) => document.clone(),
        }
    }
}

/// Sugar for comparison havings on an aggregated metric
///
/// `Aggregation::new("revenue").gt(20)` builds a greaterThan having.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation(String);

impl Aggregation {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn gt(&self, value: impl Into<Value>) -> Having {
        Having::greater_than(self.0.clone(), value)
    }

    pub fn lt(&self, value: impl Into<Value>) -> Having {
        Having::less_than(self.0.clone(), value)
    }

    pub fn equal_to(&self, value: impl Into<Value>) -> Having {
        Having::equal_to(self.0.clone(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greater_than() {
        let having = Having::greater_than("revenue", 20);
        assert_eq!(
            having.build(),
            json!({"type": "greaterThan", "aggregation": "revenue", "value": 20})
        );
    }

    #[test]
    fn test_aggregation_sugar() {
        assert_eq!(
            Aggregation::new("revenue").gt(20).build(),
            json!({"type": "greaterThan", "aggregation": "revenue", "value": 20})
        );
        assert_eq!(
            Aggregation::new("revenue").lt(20).build(),
            json!({"type": "lessThan", "aggregation": "revenue", "value": 20})
        );
        assert_eq!(
            Aggregation::new("revenue").equal_to(20).build(),
            json!({"type": "equalTo", "aggregation": "revenue", "value": 20})
        );
    }

    #[test]
    fn test_dim_selector() {
        assert_eq!(
            Having::dim_selector("country", "US").build(),
            json!({"type": "dimSelector", "dimension": "country", "value": "US"})
        );
    }

    #[test]
    fn test_filter_wrapping() {
        let having = Having::filter(Filter::selector("name", "druid"));
        assert_eq!(
            having.build(),
            json!({
                "type": "filter",
                "filter": {"type": "selector", "dimension": "name", "value": "druid"}
            })
        );
    }

    #[test]
    fn test_raw_filter_document() {
        let doc = json!({"type": "selector", "dimension": "name", "value": "druid"});
        let having = Having::filter(Filter::raw(doc.clone()));
        assert_eq!(having.build(), json!({"type": "filter", "filter": doc}));
    }

    #[test]
    fn test_and_does_not_flatten() {
        // unlike filters: (a AND b) AND c keeps the inner and-node as one
        // child next to c, two levels deep
        let a = Aggregation::new("a").gt(1);
        let b = Aggregation::new("b").gt(2);
        let c = Aggregation::new("c").gt(3);
        let combined = a.clone().and(b.clone()).and(c.clone());
        assert_eq!(
            combined.build(),
            json!({
                "type": "and",
                "havingSpecs": [
                    {
                        "type": "and",
                        "havingSpecs": [a.build(), b.build()]
                    },
                    c.build()
                ]
            })
        );
    }

    #[test]
    fn test_or_does_not_flatten() {
        let a = Aggregation::new("a").gt(1);
        let b = Aggregation::new("b").gt(2);
        let c = Aggregation::new("c").gt(3);
        let combined = a.or(b).or(c);
        let built = combined.build();
        assert_eq!(built["havingSpecs"].as_array().unwrap().len(), 2);
        assert_eq!(built["havingSpecs"][0]["type"], json!("or"));
    }

    #[test]
    fn test_negate() {
        let having = Aggregation::new("revenue").gt(20).negate();
        assert_eq!(
            having.build(),
            json!({
                "type": "not",
                "havingSpec": {"type": "greaterThan", "aggregation": "revenue", "value": 20}
            })
        );
    }
}
