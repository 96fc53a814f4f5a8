//! Post-aggregators
//!
//! Post-aggregators combine already-aggregated values, after aggregation
//! has run. Arithmetic composition (`add`/`sub`/`mul`/`div`) synthesizes
//! a provisional name from its operand names; theta sketch set
//! operations do the same with `_OR_`/`_AND_`/`_NOT_` separators.
//! [`build_post_aggregators`] overwrites each top-level entry's name with
//! its map key, while nested nodes keep their synthesized names.

use serde_json::{json, Value};

/// Arithmetic operators over post-aggregated values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithmeticOp {
    /// The operator symbol used on the wire
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }

    /// The textual tag used when synthesizing composite names
    pub fn name_tag(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
        }
    }
}

/// Set operations over theta sketches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SketchOp {
    Union,
    Intersect,
    Not,
}

impl SketchOp {
    pub fn func(&self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::Intersect => "INTERSECT",
            Self::Not => "NOT",
        }
    }

    fn name_separator(&self) -> &'static str {
        match self {
            Self::Union => "_OR_",
            Self::Intersect => "_AND_",
            Self::Not => "_NOT_",
        }
    }
}

/// A post-aggregation expression with its (possibly synthesized) name
#[derive(Debug, Clone, PartialEq)]
pub struct PostAggregator {
    pub name: String,
    kind: PostAggKind,
}

#[derive(Debug, Clone, PartialEq)]
enum PostAggKind {
    FieldAccess {
        field_name: String,
    },
    Constant {
        value: Value,
    },
    HyperUniqueCardinality {
        field_name: String,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: Box<PostAggregator>,
        right: Box<PostAggregator>,
    },
    /// Reference to a theta sketch aggregator; serializes as fieldAccess
    ThetaSketch {
        field_name: String,
    },
    ThetaSketchEstimate {
        field: Box<PostAggregator>,
    },
    ThetaSketchSetOp {
        op: SketchOp,
        fields: Vec<PostAggregator>,
    },
    Raw(Value),
}

impl PostAggregator {
    /// Access an aggregated metric by name
    pub fn field(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: PostAggKind::FieldAccess {
                field_name: name.clone(),
            },
            name,
        }
    }

    /// A constant operand, named `const`
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::constant_named(value, "const")
    }

    /// A constant operand with an explicit output name
    pub fn constant_named(value: impl Into<Value>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PostAggKind::Constant {
                value: value.into(),
            },
        }
    }

    /// Exact cardinality of a hyperUnique aggregate
    pub fn hyper_unique_cardinality(field_name: impl Into<String>) -> Self {
        let field_name = field_name.into();
        Self {
            name: field_name.clone(),
            kind: PostAggKind::HyperUniqueCardinality { field_name },
        }
    }

    /// Reference a theta sketch aggregate for set operations
    pub fn theta_sketch(field_name: impl Into<String>) -> Self {
        let field_name = field_name.into();
        Self {
            name: field_name.clone(),
            kind: PostAggKind::ThetaSketch { field_name },
        }
    }

    /// Estimate the distinct count of a theta sketch expression
    pub fn theta_sketch_estimate(field: PostAggregator) -> Self {
        Self {
            name: field.name.clone(),
            kind: PostAggKind::ThetaSketchEstimate {
                field: Box::new(field),
            },
        }
    }

    /// Wrap a pre-built wire document under the given name
    pub fn raw(name: impl Into<String>, document: Value) -> Self {
        Self {
            name: name.into(),
            kind: PostAggKind::Raw(document),
        }
    }

    pub fn add(self, other: PostAggregator) -> Self {
        self.arithmetic(ArithmeticOp::Add, other)
    }

    pub fn sub(self, other: PostAggregator) -> Self {
        self.arithmetic(ArithmeticOp::Sub, other)
    }

    pub fn mul(self, other: PostAggregator) -> Self {
        self.arithmetic(ArithmeticOp::Mul, other)
    }

    pub fn div(self, other: PostAggregator) -> Self {
        self.arithmetic(ArithmeticOp::Div, other)
    }

    /// Combine two post-aggregators arithmetically. The synthesized name
    /// joins both operand names with the operator's textual tag.
    pub fn arithmetic(self, op: ArithmeticOp, other: PostAggregator) -> Self {
        Self {
            name: format!("{}{}{}", self.name, op.name_tag(), other.name),
            kind: PostAggKind::Arithmetic {
                op,
                left: Box::new(self),
                right: Box::new(other),
            },
        }
    }

    /// Theta sketch union (`a_OR_b`)
    pub fn union(self, other: PostAggregator) -> Self {
        self.sketch_op(SketchOp::Union, other)
    }

    /// Theta sketch intersection (`a_AND_b`)
    pub fn intersect(self, other: PostAggregator) -> Self {
        self.sketch_op(SketchOp::Intersect, other)
    }

    /// Theta sketch set difference (`a_NOT_b`)
    pub fn minus(self, other: PostAggregator) -> Self {
        self.sketch_op(SketchOp::Not, other)
    }

    /// Chained operations nest: each application wraps the previous
    /// result as one operand of a new set-op node.
    pub fn sketch_op(self, op: SketchOp, other: PostAggregator) -> Self {
        Self {
            name: format!("{}{}{}", self.name, op.name_separator(), other.name),
            kind: PostAggKind::ThetaSketchSetOp {
                op,
                fields: vec![self, other],
            },
        }
    }

    /// Lower to the wire document.
    ///
    /// Composite nodes (arithmetic, set-op, constant) carry their name;
    /// plain references (fieldAccess, hyperUniqueCardinality, estimate)
    /// do not - top-level names are stamped by
    /// [`build_post_aggregators`].
    pub fn build(&self) -> Value {
        match &self.kind {
            PostAggKind::FieldAccess { field_name } => {
                json!({"type": "fieldAccess", "fieldName": field_name})
            }
            PostAggKind::Constant { value } => {
                json!({"type": "constant", "name": self.name, "value": value})
            }
            PostAggKind::HyperUniqueCardinality { field_name } => {
                json!({"type": "hyperUniqueCardinality", "fieldName": field_name})
            }
            PostAggKind::Arithmetic { op, left, right } => json!({
                "type": "arithmetic",
                "name": self.name,
                "fn": op.symbol(),
                "fields": [left.build(), right.build()],
            }),
            PostAggKind::ThetaSketch { field_name } => {
                json!({"type": "fieldAccess", "fieldName": field_name})
            }
            PostAggKind::ThetaSketchEstimate { field } => json!({
                "type": "thetaSketchEstimate",
                "field": field.build(),
            }),
            PostAggKind::ThetaSketchSetOp { op, fields } => json!({
                "type": "thetaSketchSetOp",
                "name": self.name,
                "func": op.func(),
                "fields": fields.iter().map(PostAggregator::build).collect::<Vec<_>>(),
            }),
            PostAggKind::Raw(document) => document.clone(),
        }
    }
}

/// Lower an ordered name-to-post-aggregator map to the wire list,
/// overwriting each top-level entry's `name` with its map key.
pub fn build_post_aggregators(post_aggregations: &[(String, PostAggregator)]) -> Vec<Value> {
    post_aggregations
        .iter()
        .map(|(name, post_aggregator)| {
            let mut doc = post_aggregator.build();
            if let Some(obj) = doc.as_object_mut() {
                obj.insert("name".into(), json!(name));
            }
            doc
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_name_synthesis() {
        let avg = PostAggregator::field("sum").div(PostAggregator::field("count"));
        assert_eq!(avg.name, "sumdivcount");

        let expr = PostAggregator::field("x").add(PostAggregator::field("y"));
        assert_eq!(expr.name, "xaddy");
    }

    #[test]
    fn test_arithmetic_build() {
        let avg = PostAggregator::field("sum").div(PostAggregator::field("count"));
        assert_eq!(
            avg.build(),
            json!({
                "type": "arithmetic",
                "name": "sumdivcount",
                "fn": "/",
                "fields": [
                    {"type": "fieldAccess", "fieldName": "sum"},
                    {"type": "fieldAccess", "fieldName": "count"}
                ]
            })
        );
    }

    #[test]
    fn test_top_level_rename() {
        let paggs = vec![(
            "avg".to_string(),
            PostAggregator::field("sum").div(PostAggregator::field("count")),
        )];
        let built = build_post_aggregators(&paggs);
        assert_eq!(built[0]["name"], json!("avg"));
        assert_eq!(built[0]["fn"], json!("/"));
    }

    #[test]
    fn test_nested_arithmetic_keeps_synthesized_name() {
        // ((sum / count) * 100) registered as "percent": only the outer
        // node is renamed, the inner arithmetic keeps its synthesized name
        let expr = PostAggregator::field("sum")
            .div(PostAggregator::field("count"))
            .mul(PostAggregator::constant(100));
        let built = build_post_aggregators(&[("percent".to_string(), expr)]);
        assert_eq!(built[0]["name"], json!("percent"));
        assert_eq!(built[0]["fields"][0]["name"], json!("sumdivcount"));
    }

    #[test]
    fn test_constant() {
        assert_eq!(
            PostAggregator::constant(100).build(),
            json!({"type": "constant", "name": "const", "value": 100})
        );
        assert_eq!(
            PostAggregator::constant_named(100, "hundred").build(),
            json!({"type": "constant", "name": "hundred", "value": 100})
        );
    }

    #[test]
    fn test_hyper_unique_cardinality() {
        assert_eq!(
            PostAggregator::hyper_unique_cardinality("uniques").build(),
            json!({"type": "hyperUniqueCardinality", "fieldName": "uniques"})
        );
    }

    fn theta(name: &str) -> PostAggregator {
        PostAggregator::theta_sketch(name)
    }

    #[test]
    fn test_theta_sketch_estimate_plain() {
        let built = build_post_aggregators(&[(
            "pag1".to_string(),
            PostAggregator::theta_sketch_estimate(theta("theta1")),
        )]);
        assert_eq!(
            built[0],
            json!({
                "name": "pag1",
                "type": "thetaSketchEstimate",
                "field": {"type": "fieldAccess", "fieldName": "theta1"}
            })
        );
    }

    #[test]
    fn test_theta_set_ops() {
        let cases = [
            (
                theta("theta1").intersect(theta("theta2")),
                "INTERSECT",
                "theta1_AND_theta2",
            ),
            (
                theta("theta1").union(theta("theta2")),
                "UNION",
                "theta1_OR_theta2",
            ),
            (
                theta("theta1").minus(theta("theta2")),
                "NOT",
                "theta1_NOT_theta2",
            ),
        ];
        for (expr, func, name) in cases {
            assert_eq!(
                expr.build(),
                json!({
                    "type": "thetaSketchSetOp",
                    "name": name,
                    "func": func,
                    "fields": [
                        {"type": "fieldAccess", "fieldName": "theta1"},
                        {"type": "fieldAccess", "fieldName": "theta2"}
                    ]
                })
            );
        }
    }

    #[test]
    fn test_chained_theta_set_ops_nest() {
        // (theta1 NOT theta2) AND theta3: the previous set-op becomes one
        // operand of the new node, and its synthesized name is retained
        let expr = theta("theta1").minus(theta("theta2")).intersect(theta("theta3"));
        let built = build_post_aggregators(&[(
            "pag5".to_string(),
            PostAggregator::theta_sketch_estimate(expr),
        )]);
        assert_eq!(
            built[0],
            json!({
                "name": "pag5",
                "type": "thetaSketchEstimate",
                "field": {
                    "type": "thetaSketchSetOp",
                    "name": "theta1_NOT_theta2_AND_theta3",
                    "func": "INTERSECT",
                    "fields": [
                        {
                            "type": "thetaSketchSetOp",
                            "name": "theta1_NOT_theta2",
                            "func": "NOT",
                            "fields": [
                                {"type": "fieldAccess", "fieldName": "theta1"},
                                {"type": "fieldAccess", "fieldName": "theta2"}
                            ]
                        },
                        {"type": "fieldAccess", "fieldName": "theta3"}
                    ]
                }
            })
        );
    }
}
