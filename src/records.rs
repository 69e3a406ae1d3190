//! Reading newline-delimited JSON records.

use crate::models::{Record, RecordIssue};
use serde_json::Value;
use tracing::{debug, warn};

/// Records read from an input, plus the lines that had to be skipped
#[derive(Debug, Clone, Default)]
pub struct ParsedRecords {
    pub records: Vec<Record>,
    pub issues: Vec<RecordIssue>,
}

/// Parse an input document into records.
///
/// The input is one JSON object per line. Blank lines and `//` comment lines
/// are ignored. An input that is one complete JSON array is read as an array
/// of records instead. Lines that are not valid records are skipped and
/// reported as [`RecordIssue::MalformedRecord`].
pub fn parse_records(input: &str) -> ParsedRecords {
    let parsed = match parse_array(input) {
        Some(parsed) => parsed,
        None => parse_lines(input),
    };

    debug!(
        records = parsed.records.len(),
        skipped = parsed.issues.len(),
        "parsed input records"
    );
    parsed
}

fn parse_lines(input: &str) -> ParsedRecords {
    let mut parsed = ParsedRecords::default();

    for (index, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        let result = serde_json::from_str::<Value>(line)
            .map_err(|e| format!("invalid JSON: {e}"))
            .and_then(Record::from_value);
        push_result(&mut parsed, index + 1, result);
    }

    parsed
}

/// `None` unless the whole input is one JSON array
fn parse_array(input: &str) -> Option<ParsedRecords> {
    if !input.trim_start().starts_with('[') {
        return None;
    }

    let values = match serde_json::from_str::<Vec<Value>>(input) {
        Ok(values) => values,
        Err(e) => {
            debug!(error = %e, "input is not a single JSON array, reading it line by line");
            return None;
        }
    };

    let mut parsed = ParsedRecords::default();
    for (index, value) in values.into_iter().enumerate() {
        push_result(&mut parsed, index + 1, Record::from_value(value));
    }

    Some(parsed)
}

fn push_result(parsed: &mut ParsedRecords, line: usize, result: Result<Record, String>) {
    match result {
        Ok(record) => parsed.records.push(record),
        Err(reason) => {
            warn!(line, %reason, "skipping malformed record");
            parsed
                .issues
                .push(RecordIssue::MalformedRecord { line, reason });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordKind;

    #[test]
    fn test_parse_nodes_and_edges() {
        let input = r#"
{"type": "discovery", "id": "a", "title": "Alpha", "successors": ["b"]}
{"id": "b"}
{"type": "edge", "id": "e1", "source": "a", "target": "b", "label": "enables"}
"#;
        let parsed = parse_records(input);

        assert!(parsed.issues.is_empty());
        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.records[0].kind(), RecordKind::Node);
        assert_eq!(parsed.records[1].kind(), RecordKind::Node);
        assert_eq!(parsed.records[2].kind(), RecordKind::Edge);

        match &parsed.records[0] {
            Record::Node(node) => {
                assert_eq!(node.successors, vec!["b"]);
                assert_eq!(node.label(), "Alpha");
                assert_eq!(node.payload.get("type").and_then(Value::as_str), Some("discovery"));
            }
            other => panic!("expected node, got {other:?}"),
        }
        match &parsed.records[2] {
            Record::Edge(edge) => {
                assert_eq!(edge.source, "a");
                assert_eq!(edge.payload.get("label").and_then(Value::as_str), Some("enables"));
            }
            other => panic!("expected edge, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let input = "{\"id\": \"a\"}\nnot json\n{\"type\": \"edge\", \"id\": \"e1\", \"source\": \"a\"}\n[1, 2]\n{\"id\": \"\"}\n{\"id\": \"b\"}";
        let parsed = parse_records(input);

        assert_eq!(parsed.records.len(), 2);
        let lines: Vec<usize> = parsed
            .issues
            .iter()
            .map(|issue| match issue {
                RecordIssue::MalformedRecord { line, .. } => *line,
                other => panic!("unexpected issue {other:?}"),
            })
            .collect();
        assert_eq!(lines, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_blank_and_comment_lines_ignored() {
        let input = "// discoveries\n\n{\"id\": \"a\"}\n   \n";
        let parsed = parse_records(input);

        assert_eq!(parsed.records.len(), 1);
        assert!(parsed.issues.is_empty());
    }

    #[test]
    fn test_array_input() {
        let input = r#"[{"id": "a", "successors": ["b"]}, {"id": "b"}, 7]"#;
        let parsed = parse_records(input);

        assert_eq!(parsed.records.len(), 2);
        assert_eq!(
            parsed.issues,
            vec![RecordIssue::MalformedRecord {
                line: 3,
                reason: "expected a JSON object, found a number".to_string(),
            }]
        );
    }

    #[test]
    fn test_bad_array_line_first_keeps_later_records() {
        let input = "[1, 2]\n{\"id\": \"a\", \"successors\": [\"b\"]}\n{\"id\": \"b\"}\n";
        let parsed = parse_records(input);

        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].id(), "a");
        assert_eq!(
            parsed.issues,
            vec![RecordIssue::MalformedRecord {
                line: 1,
                reason: "expected a JSON object, found an array".to_string(),
            }]
        );
    }

    #[test]
    fn test_empty_input() {
        let parsed = parse_records("");
        assert!(parsed.records.is_empty());
        assert!(parsed.issues.is_empty());
    }
}
