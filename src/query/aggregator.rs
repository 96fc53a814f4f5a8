//! Aggregators
//!
//! An aggregator tells the engine how to fold raw rows into one metric
//! value. Aggregators are registered under output names in an ordered
//! map; [`build_aggregators`] lowers that map to the wire list, stamping
//! each map key as the aggregator's `name`. For filtered aggregators the
//! name lands on the innermost wrapped aggregator, not the wrapper.

use serde_json::{json, Value};

use super::filter::Filter;

/// A specification for folding raw rows into one metric value
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregator {
    /// Row count
    Count { field_name: String },
    /// Sum of a long-typed column
    LongSum { field_name: String },
    /// Sum of a double-typed column
    DoubleSum { field_name: String },
    /// Minimum of a column
    Min { field_name: String },
    /// Maximum of a column
    Max { field_name: String },
    LongMin { field_name: String },
    LongMax { field_name: String },
    DoubleMin { field_name: String },
    DoubleMax { field_name: String },
    /// Approximate distinct count over a hyperUnique column
    HyperUnique { field_name: String },
    /// Approximate distinct count over plain dimensions
    Cardinality {
        field_names: Vec<String>,
        by_row: bool,
    },
    /// Theta sketch for distinct counts supporting set operations
    ThetaSketch { field_name: String },
    /// Apply the inner aggregator only to rows matching the filter
    Filtered {
        filter: Filter,
        aggregator: Box<Aggregator>,
    },
    /// A pre-built wire document, passed through untouched
    Raw(Value),
}

impl Aggregator {
    pub fn count(field_name: impl Into<String>) -> Self {
        Self::Count {
            field_name: field_name.into(),
        }
    }

    pub fn long_sum(field_name: impl Into<String>) -> Self {
        Self::LongSum {
            field_name: field_name.into(),
        }
    }

    pub fn double_sum(field_name: impl Into<String>) -> Self {
        Self::DoubleSum {
            field_name: field_name.into(),
        }
    }

    pub fn min(field_name: impl Into<String>) -> Self {
        Self::Min {
            field_name: field_name.into(),
        }
    }

    pub fn max(field_name: impl Into<String>) -> Self {
        Self::Max {
            field_name: field_name.into(),
        }
    }

    pub fn long_min(field_name: impl Into<String>) -> Self {
        Self::LongMin {
            field_name: field_name.into(),
        }
    }

    pub fn long_max(field_name: impl Into<String>) -> Self {
        Self::LongMax {
            field_name: field_name.into(),
        }
    }

    pub fn double_min(field_name: impl Into<String>) -> Self {
        Self::DoubleMin {
            field_name: field_name.into(),
        }
    }

    pub fn double_max(field_name: impl Into<String>) -> Self {
        Self::DoubleMax {
            field_name: field_name.into(),
        }
    }

    pub fn hyper_unique(field_name: impl Into<String>) -> Self {
        Self::HyperUnique {
            field_name: field_name.into(),
        }
    }

    pub fn cardinality(
        field_names: impl IntoIterator<Item = impl Into<String>>,
        by_row: bool,
    ) -> Self {
        Self::Cardinality {
            field_names: field_names.into_iter().map(Into::into).collect(),
            by_row,
        }
    }

    pub fn theta_sketch(field_name: impl Into<String>) -> Self {
        Self::ThetaSketch {
            field_name: field_name.into(),
        }
    }

    /// Wrap an aggregator so it only sees rows matching the filter
    pub fn filtered(filter: Filter, aggregator: Aggregator) -> Self {
        Self::Filtered {
            filter,
            aggregator: Box::new(aggregator),
        }
    }

    pub fn raw(document: Value) -> Self {
        Self::Raw(document)
    }

    /// Lower to the wire document, without an output name
    pub fn build(&self) -> Value {
        match self {
            Self::Count { field_name } => json!({"type": "count", "fieldName": field_name}),
            Self::LongSum { field_name } => json!({"type": "longSum", "fieldName": field_name}),
            Self::DoubleSum { field_name } => {
                json!({"type": "doubleSum", "fieldName": field_name})
            }
            Self::Min { field_name } => json!({"type": "min", "fieldName": field_name}),
            Self::Max { field_name } => json!({"type": "max", "fieldName": field_name}),
            Self::LongMin { field_name } => json!({"type": "longMin", "fieldName": field_name}),
            Self::LongMax { field_name } => json!({"type": "longMax", "fieldName": field_name}),
            Self::DoubleMin { field_name } => {
                json!({"type": "doubleMin", "fieldName": field_name})
            }
            Self::DoubleMax { field_name } => {
                json!({"type": "doubleMax", "fieldName": field_name})
            }
            Self::HyperUnique { field_name } => {
                json!({"type": "hyperUnique", "fieldName": field_name})
            }
            Self::Cardinality {
                field_names,
                by_row,
            } => json!({
                "type": "cardinality",
                "fieldNames": field_names,
                "byRow": by_row,
            }),
            Self::ThetaSketch { field_name } => {
                json!({"type": "thetaSketch", "fieldName": field_name})
            }
            Self::Filtered { filter, aggregator } => json!({
                "type": "filtered",
                "filter": filter.build(),
                "aggregator": aggregator.build(),
            }),
            Self::Raw(document) => document.clone(),
        }
    }
}

/// Lower an ordered name-to-aggregator map to the wire list.
///
/// Each entry's map key is stamped as its `name`; for filtered
/// aggregators the stamp descends to the innermost wrapped aggregator.
pub fn build_aggregators(aggregations: &[(String, Aggregator)]) -> Vec<Value> {
    aggregations
        .iter()
        .map(|(name, aggregator)| {
            let mut doc = aggregator.build();
            stamp_name(&mut doc, name);
            doc
        })
        .collect()
}

fn stamp_name(doc: &mut Value, name: &str) {
    let mut target = doc;
    while target.get("type").and_then(Value::as_str) == Some("filtered") {
        target = &mut target["aggregator"];
    }
    if let Some(obj) = target.as_object_mut() {
        obj.insert("name".into(), json!(name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_aggregators() {
        let cases = [
            (Aggregator::long_sum("metric"), "longSum"),
            (Aggregator::double_sum("metric"), "doubleSum"),
            (Aggregator::min("metric"), "min"),
            (Aggregator::max("metric"), "max"),
            (Aggregator::long_min("metric"), "longMin"),
            (Aggregator::long_max("metric"), "longMax"),
            (Aggregator::double_min("metric"), "doubleMin"),
            (Aggregator::double_max("metric"), "doubleMax"),
            (Aggregator::count("metric"), "count"),
            (Aggregator::hyper_unique("metric"), "hyperUnique"),
            (Aggregator::theta_sketch("metric"), "thetaSketch"),
        ];
        for (aggregator, type_tag) in cases {
            assert_eq!(
                aggregator.build(),
                json!({"type": type_tag, "fieldName": "metric"})
            );
        }
    }

    #[test]
    fn test_cardinality() {
        let agg = Aggregator::cardinality(["dim1", "dim2"], true);
        assert_eq!(
            agg.build(),
            json!({"type": "cardinality", "fieldNames": ["dim1", "dim2"], "byRow": true})
        );
    }

    #[test]
    fn test_build_aggregators_stamps_names() {
        let aggs = vec![
            ("agg1".to_string(), Aggregator::count("metric1")),
            ("agg2".to_string(), Aggregator::long_sum("metric2")),
            ("agg3".to_string(), Aggregator::hyper_unique("metric3")),
        ];
        assert_eq!(
            build_aggregators(&aggs),
            vec![
                json!({"name": "agg1", "type": "count", "fieldName": "metric1"}),
                json!({"name": "agg2", "type": "longSum", "fieldName": "metric2"}),
                json!({"name": "agg3", "type": "hyperUnique", "fieldName": "metric3"}),
            ]
        );
    }

    #[test]
    fn test_filtered_aggregator_names_innermost() {
        let agg = Aggregator::filtered(
            Filter::selector("dim", "val"),
            Aggregator::count("metric"),
        );
        let aggs = vec![("f".to_string(), agg)];
        assert_eq!(
            build_aggregators(&aggs),
            vec![json!({
                "type": "filtered",
                "filter": {"type": "selector", "dimension": "dim", "value": "val"},
                "aggregator": {"type": "count", "fieldName": "metric", "name": "f"}
            })]
        );
    }

    #[test]
    fn test_nested_filtered_aggregator_names_innermost() {
        let agg = Aggregator::filtered(
            Filter::selector("d1", "v1"),
            Aggregator::filtered(Filter::selector("d2", "v2"), Aggregator::count("metric")),
        );
        let built = build_aggregators(&[("deep".to_string(), agg)]);
        // only the innermost aggregator carries the output name
        assert_eq!(built[0]["aggregator"]["aggregator"]["name"], json!("deep"));
        assert!(built[0].get("name").is_none());
        assert!(built[0]["aggregator"].get("name").is_none());
    }
}
