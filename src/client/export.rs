//! Result flattening and tabular export
//!
//! Native query results come back in per-type shapes: timeseries items
//! hold a single `result` object, topN items a `result` array, groupBy
//! items an `event` object plus a `version`. `to_rows` flattens all
//! three into plain row objects with the timestamp appended; `export_tsv`
//! writes those rows tab-separated.

use serde_json::{Map, Value};

use crate::query::QueryType;

use super::error::{ClientError, ClientResult};

type Row = Map<String, Value>;

/// Flatten a native query result into row objects
pub fn to_rows(query_type: QueryType, result: &[Value]) -> ClientResult<Vec<Row>> {
    let mut rows = Vec::new();
    match query_type {
        QueryType::Timeseries => {
            for item in result {
                let mut row = inner_object(item, "result")?;
                row.insert("timestamp".into(), item["timestamp"].clone());
                rows.push(row);
            }
        }
        QueryType::TopN => {
            for item in result {
                let entries = item
                    .get("result")
                    .and_then(Value::as_array)
                    .ok_or(ClientError::NoResult)?;
                for entry in entries {
                    let mut row = entry
                        .as_object()
                        .cloned()
                        .ok_or(ClientError::NoResult)?;
                    row.insert("timestamp".into(), item["timestamp"].clone());
                    rows.push(row);
                }
            }
        }
        QueryType::GroupBy => {
            for item in result {
                let mut row = inner_object(item, "event")?;
                row.insert("timestamp".into(), item["timestamp"].clone());
                row.insert("version".into(), item["version"].clone());
                rows.push(row);
            }
        }
        other => return Err(ClientError::UnsupportedExport(other.as_str().to_string())),
    }
    Ok(rows)
}

fn inner_object(item: &Value, key: &str) -> ClientResult<Row> {
    item.get(key)
        .and_then(Value::as_object)
        .cloned()
        .ok_or(ClientError::NoResult)
}

/// Write a flattened result as tab-separated values.
///
/// The header comes from the first row's keys; every row is emitted in
/// that key order. An empty result writes nothing.
pub fn export_tsv<W: std::io::Write>(
    query_type: QueryType,
    result: &[Value],
    writer: W,
) -> ClientResult<()> {
    let rows = to_rows(query_type, result)?;
    let mut tsv = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);

    let Some(first) = rows.first() else {
        return Ok(());
    };
    let header: Vec<&String> = first.keys().collect();
    tsv.write_record(&header)?;
    for row in &rows {
        let record: Vec<String> = header
            .iter()
            .map(|key| cell(row.get(*key).unwrap_or(&Value::Null)))
            .collect();
        tsv.write_record(&record)?;
    }
    tsv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// A string cell keeps its text as-is; everything else uses its JSON form
fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn topn_result() -> Vec<Value> {
        vec![json!({
            "timestamp": "2013-10-04T00:00:00.000Z",
            "result": [
                {"count": 7.0, "user_name": "user_1"},
                {"count": 6.0, "user_name": "user_2"}
            ]
        })]
    }

    #[test]
    fn test_to_rows_timeseries() {
        let result = vec![
            json!({"timestamp": "2013-10-04T00:00:00.000Z", "result": {"count": 2}}),
            json!({"timestamp": "2013-10-05T00:00:00.000Z", "result": {"count": 3}}),
        ];
        let rows = to_rows(QueryType::Timeseries, &result).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["count"], json!(2));
        assert_eq!(rows[0]["timestamp"], json!("2013-10-04T00:00:00.000Z"));
    }

    #[test]
    fn test_to_rows_topn_flattens() {
        let rows = to_rows(QueryType::TopN, &topn_result()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["user_name"], json!("user_2"));
        assert_eq!(rows[1]["timestamp"], json!("2013-10-04T00:00:00.000Z"));
    }

    #[test]
    fn test_to_rows_groupby_carries_version() {
        let result = vec![json!({
            "timestamp": "2013-10-04T00:00:00.000Z",
            "version": "v1",
            "event": {"user_name": "user_1", "count": 4}
        })];
        let rows = to_rows(QueryType::GroupBy, &result).unwrap();
        assert_eq!(rows[0]["version"], json!("v1"));
        assert_eq!(rows[0]["count"], json!(4));
    }

    #[test]
    fn test_to_rows_unsupported_type() {
        let err = to_rows(QueryType::TimeBoundary, &[]).unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedExport(t) if t == "timeBoundary"));
    }

    #[test]
    fn test_export_tsv() {
        let mut out = Vec::new();
        export_tsv(QueryType::TopN, &topn_result(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "count\tuser_name\ttimestamp");
        assert_eq!(lines[1], "7.0\tuser_1\t2013-10-04T00:00:00.000Z");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_export_tsv_empty_result() {
        let mut out = Vec::new();
        export_tsv(QueryType::Timeseries, &[], &mut out).unwrap();
        assert!(out.is_empty());
    }
}
