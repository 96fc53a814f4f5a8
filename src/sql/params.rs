//! SQL parameter binding
//!
//! Statements use named placeholders of the form `%(key)s`. The dynamic
//! binder rewrites them to positional `?` markers plus an ordered list of
//! typed parameter records for the engine's parameterized-query support;
//! the static path inlines quoted literals directly into the text.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;

use super::error::{SqlError, SqlResult};

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%\((\w+)\)s").unwrap())
}

/// Combined pattern for the static path: `%%` escapes and placeholders
fn static_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%%|%\((\w+)\)s").unwrap())
}

/// Engine-side SQL types inferred from parameter values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParamType {
    Boolean,
    Integer,
    Float,
    Varchar,
}

impl ParamType {
    fn infer(value: &Value) -> Self {
        match value {
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Float,
            _ => Self::Varchar,
        }
    }
}

/// One typed parameter record, serialized as `{"value": ..., "type": ...}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlParam {
    pub value: Value,
    #[serde(rename = "type")]
    pub param_type: ParamType,
}

impl SqlParam {
    pub fn new(value: Value) -> Self {
        let param_type = ParamType::infer(&value);
        Self { value, param_type }
    }
}

/// Rewrite named placeholders to positional `?` markers with typed records.
///
/// Placeholders are resolved in order of appearance. A bound array expands
/// to one `?` per element, joined by `", "`, with one record per element.
/// Empty `params` skips scanning entirely and returns the statement as-is
/// with no records.
///
/// Fails when the placeholder key set and the parameter key set differ in
/// either direction.
pub fn apply_dynamic(
    sql: &str,
    params: &[(String, Value)],
) -> SqlResult<(String, Option<Vec<SqlParam>>)> {
    if params.is_empty() {
        return Ok((sql.to_string(), None));
    }

    let found: BTreeSet<&str> = placeholder_re()
        .captures_iter(sql)
        .map(|caps| caps.get(1).unwrap().as_str())
        .collect();
    let supplied: BTreeSet<&str> = params.iter().map(|(key, _)| key.as_str()).collect();
    if found != supplied {
        return Err(SqlError::ParameterMismatch);
    }

    let by_key: HashMap<&str, &Value> =
        params.iter().map(|(key, value)| (key.as_str(), value)).collect();
    let mut records = Vec::new();
    let rewritten = placeholder_re().replace_all(sql, |caps: &Captures| {
        let value = by_key[caps.get(1).unwrap().as_str()];
        match value {
            Value::Array(elements) => {
                let markers: Vec<&str> = elements
                    .iter()
                    .map(|element| {
                        records.push(SqlParam::new(element.clone()));
                        "?"
                    })
                    .collect();
                markers.join(", ")
            }
            other => {
                records.push(SqlParam::new(other.clone()));
                "?".to_string()
            }
        }
    });

    Ok((rewritten.into_owned(), Some(records)))
}

/// Inline a value as a SQL literal
fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

/// Substitute placeholders with inline literals.
///
/// `%%` unescapes to a literal `%`, but only when parameters are supplied;
/// with empty `params` the statement is returned untouched, stray `%`
/// sequences included. Fails when a placeholder names a key that was not
/// supplied.
pub fn apply_static(sql: &str, params: &[(String, Value)]) -> SqlResult<String> {
    if params.is_empty() {
        return Ok(sql.to_string());
    }

    let by_key: HashMap<&str, &Value> =
        params.iter().map(|(key, value)| (key.as_str(), value)).collect();
    let mut missing = false;
    let substituted = static_re().replace_all(sql, |caps: &Captures| {
        match caps.get(1) {
            None => "%".to_string(),
            Some(key) => match by_key.get(key.as_str()) {
                Some(value) => literal(value),
                None => {
                    missing = true;
                    String::new()
                }
            },
        }
    });
    if missing {
        return Err(SqlError::ParameterMismatch);
    }
    Ok(substituted.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_dynamic_no_params() {
        let sql = "SELECT * FROM t WHERE x LIKE '100%'";
        let (rewritten, records) = apply_dynamic(sql, &[]).unwrap();
        assert_eq!(rewritten, sql);
        assert!(records.is_none());
    }

    #[test]
    fn test_dynamic_single_values() {
        let sql = "SELECT * FROM t WHERE name = %(name)s AND age > %(age)s";
        let (rewritten, records) = apply_dynamic(
            sql,
            &params(&[("name", json!("alice")), ("age", json!(30))]),
        )
        .unwrap();
        assert_eq!(rewritten, "SELECT * FROM t WHERE name = ? AND age > ?");
        let records = records.unwrap();
        assert_eq!(
            serde_json::to_value(&records).unwrap(),
            json!([
                {"value": "alice", "type": "VARCHAR"},
                {"value": 30, "type": "INTEGER"}
            ])
        );
    }

    #[test]
    fn test_dynamic_appearance_order() {
        // records follow placeholder order in the text, not supply order
        let sql = "SELECT %(b)s, %(a)s";
        let (_, records) =
            apply_dynamic(sql, &params(&[("a", json!(1)), ("b", json!(2))])).unwrap();
        let records = records.unwrap();
        assert_eq!(records[0].value, json!(2));
        assert_eq!(records[1].value, json!(1));
    }

    #[test]
    fn test_dynamic_type_inference() {
        let sql = "SELECT %(b)s, %(i)s, %(f)s, %(s)s";
        let (_, records) = apply_dynamic(
            sql,
            &params(&[
                ("b", json!(true)),
                ("i", json!(7)),
                ("f", json!(1.5)),
                ("s", json!("2020-01-01")),
            ]),
        )
        .unwrap();
        let types: Vec<ParamType> = records
            .unwrap()
            .into_iter()
            .map(|record| record.param_type)
            .collect();
        assert_eq!(
            types,
            vec![
                ParamType::Boolean,
                ParamType::Integer,
                ParamType::Float,
                ParamType::Varchar
            ]
        );
    }

    #[test]
    fn test_dynamic_array_expansion() {
        let sql = "SELECT * FROM t WHERE name IN (%(names)s)";
        let (rewritten, records) = apply_dynamic(
            sql,
            &params(&[("names", json!(["alice", "bob", "charlie"]))]),
        )
        .unwrap();
        assert_eq!(rewritten, "SELECT * FROM t WHERE name IN (?, ?, ?)");
        assert_eq!(records.unwrap().len(), 3);
    }

    #[test]
    fn test_dynamic_missing_binding() {
        let sql = "SELECT %(a)s, %(b)s";
        let err = apply_dynamic(sql, &params(&[("a", json!(1))])).unwrap_err();
        assert!(matches!(err, SqlError::ParameterMismatch));
    }

    #[test]
    fn test_dynamic_unused_parameter() {
        let sql = "SELECT %(a)s";
        let err =
            apply_dynamic(sql, &params(&[("a", json!(1)), ("b", json!(2))])).unwrap_err();
        assert!(matches!(err, SqlError::ParameterMismatch));
    }

    #[test]
    fn test_static_quoting() {
        let sql = "SELECT * FROM t WHERE name = %(name)s AND active = %(active)s AND age > %(age)s";
        let substituted = apply_static(
            sql,
            &params(&[
                ("name", json!("alice")),
                ("active", json!(true)),
                ("age", json!(30)),
            ]),
        )
        .unwrap();
        assert_eq!(
            substituted,
            "SELECT * FROM t WHERE name = 'alice' AND active = TRUE AND age > 30"
        );
    }

    #[test]
    fn test_static_percent_escape() {
        let sql = "SELECT * FROM t WHERE x LIKE '100%%' AND name = %(name)s";
        let substituted = apply_static(sql, &params(&[("name", json!("alice"))])).unwrap();
        assert_eq!(
            substituted,
            "SELECT * FROM t WHERE x LIKE '100%' AND name = 'alice'"
        );
    }

    #[test]
    fn test_static_no_params_leaves_percents() {
        let sql = "SELECT * FROM t WHERE x LIKE '100%%'";
        assert_eq!(apply_static(sql, &[]).unwrap(), sql);
    }

    #[test]
    fn test_static_false_and_float() {
        let sql = "%(flag)s %(ratio)s";
        let substituted = apply_static(
            sql,
            &params(&[("flag", json!(false)), ("ratio", json!(0.5))]),
        )
        .unwrap();
        assert_eq!(substituted, "FALSE 0.5");
    }

    #[test]
    fn test_static_missing_key() {
        let err = apply_static("SELECT %(a)s", &params(&[("b", json!(1))])).unwrap_err();
        assert!(matches!(err, SqlError::ParameterMismatch));
    }
}
