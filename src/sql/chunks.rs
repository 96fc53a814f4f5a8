//! Streaming row reconstruction
//!
//! The SQL endpoint streams its result as one JSON array of row objects.
//! Rather than buffering the whole body, [`ChunkParser`] walks the text a
//! chunk at a time, tracking brace depth and string/escape state to find
//! row boundaries, and decodes each complete object as it closes. State
//! carries across chunk boundaries, so a boundary may fall anywhere: mid
//! string, mid escape sequence, or between rows.

use std::collections::VecDeque;

use serde_json::{Map, Value};

use super::error::{SqlError, SqlResult};

/// One decoded result row
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    OutsideRow,
    InsideRow,
    InsideString,
    StringEscape,
}

/// Incremental row-boundary scanner over chunked JSON text
#[derive(Debug)]
pub struct ChunkParser {
    state: ParseState,
    depth: u32,
    buf: String,
    carry: Vec<u8>,
}

impl Default for ChunkParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::OutsideRow,
            depth: 0,
            buf: String::new(),
            carry: Vec::new(),
        }
    }

    /// Feed one text chunk, returning every row completed by it
    pub fn push(&mut self, chunk: &str) -> SqlResult<Vec<Row>> {
        let mut rows = Vec::new();
        for ch in chunk.chars() {
            match self.state {
                ParseState::OutsideRow => {
                    // commas, brackets and whitespace between rows are
                    // discarded
                    if ch == '{' {
                        self.buf.clear();
                        self.buf.push(ch);
                        self.depth = 1;
                        self.state = ParseState::InsideRow;
                    }
                }
                ParseState::InsideRow => {
                    self.buf.push(ch);
                    match ch {
                        '{' => self.depth += 1,
                        '}' => {
                            self.depth -= 1;
                            if self.depth == 0 {
                                let row: Row = serde_json::from_str(&self.buf)?;
                                rows.push(row);
                                self.state = ParseState::OutsideRow;
                            }
                        }
                        '"' => self.state = ParseState::InsideString,
                        _ => {}
                    }
                }
                ParseState::InsideString => {
                    self.buf.push(ch);
                    match ch {
                        '\\' => self.state = ParseState::StringEscape,
                        '"' => self.state = ParseState::InsideRow,
                        _ => {}
                    }
                }
                ParseState::StringEscape => {
                    self.buf.push(ch);
                    self.state = ParseState::InsideString;
                }
            }
        }
        Ok(rows)
    }

    /// Feed one byte chunk. A multi-byte UTF-8 sequence split across
    /// chunks is held back until its remaining bytes arrive.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> SqlResult<Vec<Row>> {
        self.carry.extend_from_slice(chunk);
        let (valid_len, invalid) = match std::str::from_utf8(&self.carry) {
            Ok(_) => (self.carry.len(), false),
            Err(err) => (err.valid_up_to(), err.error_len().is_some()),
        };
        if invalid {
            return Err(SqlError::InvalidUtf8);
        }
        let rest = self.carry.split_off(valid_len);
        let valid = std::mem::replace(&mut self.carry, rest);
        let text = String::from_utf8(valid).map_err(|_| SqlError::InvalidUtf8)?;
        self.push(&text)
    }

    /// Check that the stream ended cleanly between rows
    pub fn finish(&self) -> SqlResult<()> {
        if self.state != ParseState::OutsideRow || !self.carry.is_empty() {
            return Err(SqlError::MalformedStream);
        }
        Ok(())
    }
}

/// Wrap a sequence of text chunks into a lazy iterator of rows.
///
/// Rows are yielded as soon as the chunk completing them has been pulled;
/// the source is never buffered whole. An unterminated row at end of
/// input yields a final `Err`.
pub fn rows_from_chunks<I>(chunks: I) -> RowsFromChunks<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    RowsFromChunks {
        parser: ChunkParser::new(),
        chunks: chunks.into_iter(),
        pending: VecDeque::new(),
        done: false,
    }
}

pub struct RowsFromChunks<I> {
    parser: ChunkParser,
    chunks: I,
    pending: VecDeque<Row>,
    done: bool,
}

impl<I> Iterator for RowsFromChunks<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = SqlResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Ok(row));
            }
            if self.done {
                return None;
            }
            match self.chunks.next() {
                Some(chunk) => match self.parser.push(chunk.as_ref()) {
                    Ok(rows) => self.pending.extend(rows),
                    Err(err) => {
                        self.done = true;
                        return Some(Err(err));
                    }
                },
                None => {
                    self.done = true;
                    if let Err(err) = self.parser.finish() {
                        return Some(Err(err));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collect(chunks: &[&str]) -> Vec<Value> {
        rows_from_chunks(chunks.iter().copied())
            .map(|row| Value::Object(row.unwrap()))
            .collect()
    }

    #[test]
    fn test_empty() {
        assert_eq!(collect(&[]), Vec::<Value>::new());
    }

    #[test]
    fn test_single_chunk() {
        let rows = collect(&[r#"[{"name": "alice"}, {"name": "bob"}, {"name": "charlie"}]"#]);
        assert_eq!(
            rows,
            vec![
                json!({"name": "alice"}),
                json!({"name": "bob"}),
                json!({"name": "charlie"})
            ]
        );
    }

    #[test]
    fn test_row_split_across_chunks() {
        let rows = collect(&[r#"[{"name": "alice"}, {"name": "b"#, r#"ob"}, {"name": "charlie"}]"#]);
        assert_eq!(
            rows,
            vec![
                json!({"name": "alice"}),
                json!({"name": "bob"}),
                json!({"name": "charlie"})
            ]
        );
    }

    #[test]
    fn test_brace_inside_string() {
        let rows = collect(&[r#"[{"name": "ali{ce"}, {"name": "bob"}]"#]);
        assert_eq!(rows, vec![json!({"name": "ali{ce"}), json!({"name": "bob"})]);
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let rows = collect(&[r#"[{"name": "ali\"ce"}, {"name": "bob"}]"#]);
        assert_eq!(
            rows,
            vec![json!({"name": "ali\"ce"}), json!({"name": "bob"})]
        );
    }

    #[test]
    fn test_string_ending_with_backslash() {
        let rows = collect(&[r#"[{"name": "\\"}]"#]);
        assert_eq!(rows, vec![json!({"name": "\\"})]);
    }

    #[test]
    fn test_escape_state_does_not_leak_between_rows() {
        let rows =
            collect(&[r#"[{"name": "alice"}, {"name": "bob\\"}, {"name": "charlie\\"}]"#]);
        assert_eq!(
            rows,
            vec![
                json!({"name": "alice"}),
                json!({"name": "bob\\"}),
                json!({"name": "charlie\\"})
            ]
        );
    }

    #[test]
    fn test_chunk_boundary_inside_escape() {
        let rows = collect(&["[{\"name\": \"a\\", "\"b\"}]"]);
        assert_eq!(rows, vec![json!({"name": "a\"b"})]);
    }

    #[test]
    fn test_nested_object_depth() {
        let rows = collect(&[r#"[{"outer": {"inner": 1}}, {"outer": {"inner": 2}}]"#]);
        assert_eq!(
            rows,
            vec![
                json!({"outer": {"inner": 1}}),
                json!({"outer": {"inner": 2}})
            ]
        );
    }

    #[test]
    fn test_unterminated_row() {
        let results: Vec<_> = rows_from_chunks([r#"[{"name": "alice"}, {"name": "b"#]).collect();
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(SqlError::MalformedStream)));
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_rows_are_lazy() {
        let chunks = [r#"[{"a": 1}"#, r#", {"a": 2}]"#];
        let mut iter = rows_from_chunks(chunks);
        // first row is available before the second chunk is consumed
        assert_eq!(iter.next().unwrap().unwrap(), json!({"a": 1}).as_object().cloned().unwrap());
    }

    #[test]
    fn test_push_bytes_split_utf8() {
        let bytes = r#"[{"name": "café münchen"}]"#.as_bytes();
        // split in the middle of the two-byte ü sequence
        let split = bytes.iter().position(|&b| b == 0xc3).unwrap() + 1;
        let mut parser = ChunkParser::new();
        let mut rows = parser.push_bytes(&bytes[..split]).unwrap();
        rows.extend(parser.push_bytes(&bytes[split..]).unwrap());
        parser.finish().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("café münchen"));
    }

    #[test]
    fn test_push_bytes_invalid_utf8() {
        let mut parser = ChunkParser::new();
        assert!(matches!(
            parser.push_bytes(&[b'[', 0xff, 0xfe]),
            Err(SqlError::InvalidUtf8)
        ));
    }

    #[test]
    fn test_finish_with_dangling_bytes() {
        let mut parser = ChunkParser::new();
        parser.push_bytes(&[b'[', 0xc3]).unwrap();
        assert!(matches!(parser.finish(), Err(SqlError::MalformedStream)));
    }
}
