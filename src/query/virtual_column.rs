//! Virtual columns
//!
//! A virtual column is an expression evaluated at query time and exposed
//! under a column name, usable anywhere a real column is.

use serde_json::{json, Map, Value};

/// An expression-backed virtual column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualColumn {
    pub name: String,
    pub expression: String,
    pub output_type: Option<String>,
}

impl VirtualColumn {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            output_type: None,
        }
    }

    /// Set the output type (e.g. `LONG`, `FLOAT`, `STRING`)
    pub fn with_output_type(mut self, output_type: impl Into<String>) -> Self {
        self.output_type = Some(output_type.into());
        self
    }

    /// Lower to the wire document; `outputType` is omitted when unset
    pub fn build(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("type".into(), json!("expression"));
        doc.insert("name".into(), json!(self.name));
        doc.insert("expression".into(), json!(self.expression));
        if let Some(output_type) = &self.output_type {
            doc.insert("outputType".into(), json!(output_type));
        }
        Value::Object(doc)
    }
}
