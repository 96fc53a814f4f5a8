//! Join data sources

use serde_json::{json, Value};

/// Supported join types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Left,
    Inner,
}

impl JoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Inner => "INNER",
        }
    }
}

/// A join between two data sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub left: String,
    pub right: String,
    pub right_prefix: String,
    pub condition: String,
    pub join_type: JoinType,
}

impl Join {
    pub fn new(
        left: impl Into<String>,
        right: impl Into<String>,
        right_prefix: impl Into<String>,
        condition: impl Into<String>,
        join_type: JoinType,
    ) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            right_prefix: right_prefix.into(),
            condition: condition.into(),
            join_type,
        }
    }

    pub fn left(
        left: impl Into<String>,
        right: impl Into<String>,
        right_prefix: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        Self::new(left, right, right_prefix, condition, JoinType::Left)
    }

    pub fn inner(
        left: impl Into<String>,
        right: impl Into<String>,
        right_prefix: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        Self::new(left, right, right_prefix, condition, JoinType::Inner)
    }

    /// A cross join: an inner join whose condition is always true
    pub fn cross(
        left: impl Into<String>,
        right: impl Into<String>,
        right_prefix: impl Into<String>,
    ) -> Self {
        Self::new(left, right, right_prefix, "1 = 1", JoinType::Inner)
    }

    /// Lower to the wire document
    pub fn build(&self) -> Value {
        json!({
            "type": "join",
            "left": self.left,
            "right": self.right,
            "rightPrefix": self.right_prefix,
            "condition": self.condition,
            "joinType": self.join_type.as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_join() {
        let join = Join::inner("some", "other", "other_", "a = other_b");
        assert_eq!(
            join.build(),
            json!({
                "type": "join",
                "joinType": "INNER",
                "condition": "a = other_b",
                "left": "some",
                "right": "other",
                "rightPrefix": "other_"
            })
        );
    }

    #[test]
    fn test_left_join() {
        let join = Join::left("some", "other", "other_", "a = other_b");
        assert_eq!(join.build()["joinType"], json!("LEFT"));
    }

    #[test]
    fn test_cross_join() {
        let join = Join::cross("some", "other", "other_");
        let built = join.build();
        assert_eq!(built["joinType"], json!("INNER"));
        assert_eq!(built["condition"], json!("1 = 1"));
    }
}
