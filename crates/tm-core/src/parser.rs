//! Line classifier shared by the latest and existing table passes

use crate::diagnostics::{Diagnostic, DiagnosticKind, Pass};
use crate::table::{PathSegment, Row, COLUMN_COUNT, SEPARATOR};
use once_cell::sync::Lazy;
use regex::Regex;

/// Indentation dashes, optional decoration such as backticks or `<`, then the
/// element or `@attribute` name.
static SEGMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(-*)[^@a-z]*(@?[a-z:-]+)\b").unwrap());

/// A line that classified as a row, with the path segment of its first column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub row: Row,
    pub segment: PathSegment,
}

/// Why a line is not a usable row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub kind: DiagnosticKind,
    /// Text to name in the diagnostic
    pub text: String,
}

impl Rejection {
    /// Attach the pass and line number
    pub fn into_diagnostic(self, pass: Pass, line: usize) -> Diagnostic {
        Diagnostic::new(pass, line, self.kind, self.text)
    }
}

/// Split a line into trimmed, non-empty columns
pub fn split_columns(line: &str) -> Vec<String> {
    line.trim()
        .split(SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract depth and element name from a first column
pub fn parse_segment(column: &str) -> Option<PathSegment> {
    let caps = SEGMENT_REGEX.captures(column.trim())?;
    let depth = caps.get(1).map_or(0, |m| m.as_str().len());
    let element = caps.get(2)?.as_str();
    Some(PathSegment::new(depth, element))
}

/// Classify a raw line as a row or say why it is not one
pub fn classify_line(line: &str) -> Result<ParsedRow, Rejection> {
    let columns = split_columns(line);
    if columns.len() != COLUMN_COUNT {
        return Err(Rejection {
            kind: DiagnosticKind::UnclassifiableRow {
                columns: columns.len(),
            },
            text: line.to_string(),
        });
    }

    let Some(segment) = parse_segment(&columns[0]) else {
        return Err(Rejection {
            kind: DiagnosticKind::UnparseablePathSegment,
            text: columns[0].clone(),
        });
    };

    let row = Row::from_columns(columns).ok_or_else(|| Rejection {
        kind: DiagnosticKind::UnclassifiableRow {
            columns: COLUMN_COUNT,
        },
        text: line.to_string(),
    })?;

    Ok(ParsedRow { row, segment })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_split_simple_row() {
        assert_eq!(split_columns("| -foo | bar | baz |"), ["-foo", "bar", "baz"]);
    }

    #[test]
    fn test_split_drops_empty_fragments() {
        assert_eq!(split_columns("  |a||b|c|  "), ["a", "b", "c"]);
        assert_eq!(split_columns("| a |   | c |"), ["a", "c"]);
        assert!(split_columns("").is_empty());
        assert!(split_columns("   ").is_empty());
    }

    #[rstest]
    #[case("note", 0, "note")]
    #[case("-pitch", 1, "pitch")]
    #[case("---@default-x", 3, "@default-x")]
    #[case("--`<step>`", 2, "step")]
    #[case("xlink:href", 0, "xlink:href")]
    #[case("-Score", 1, "Score")]
    #[case("--foo-", 2, "foo")]
    #[case("-beam (1..8)", 1, "beam")]
    fn test_parse_segment(#[case] column: &str, #[case] depth: usize, #[case] element: &str) {
        let segment = parse_segment(column).unwrap();
        assert_eq!(segment.depth, depth);
        assert_eq!(segment.element, element);
    }

    #[rstest]
    #[case("---")]
    #[case("")]
    #[case("123")]
    #[case(":---:")]
    fn test_parse_segment_rejects(#[case] column: &str) {
        assert_eq!(parse_segment(column), None);
    }

    #[test]
    fn test_classify_row() {
        let parsed = classify_line("| --pitch | yes | only for notes |").unwrap();
        assert_eq!(parsed.row, Row::new("--pitch", "yes", "only for notes"));
        assert_eq!(parsed.segment, PathSegment::new(2, "pitch"));
    }

    #[test]
    fn test_classify_wrong_column_count() {
        let rejection = classify_line("|not a row").unwrap_err();
        assert_eq!(
            rejection.kind,
            DiagnosticKind::UnclassifiableRow { columns: 1 }
        );
        assert_eq!(rejection.text, "|not a row");

        let rejection = classify_line("| a | b | c | d |").unwrap_err();
        assert_eq!(
            rejection.kind,
            DiagnosticKind::UnclassifiableRow { columns: 4 }
        );
    }

    #[test]
    fn test_classify_separator_row() {
        let rejection = classify_line("|---|---|---|").unwrap_err();
        assert_eq!(rejection.kind, DiagnosticKind::UnparseablePathSegment);
        assert_eq!(rejection.text, "---");
    }

    #[test]
    fn test_rejection_into_diagnostic() {
        let d = classify_line("").unwrap_err().into_diagnostic(Pass::Existing, 4);
        assert_eq!(d.line, 4);
        assert_eq!(d.pass, Pass::Existing);
        assert_eq!(d.kind, DiagnosticKind::UnclassifiableRow { columns: 0 });
    }
}
