//! Path-tree builder for the freshly generated table
//!
//! The generated table encodes nesting by indentation only. Reading it in
//! document order with a [`PathStack`] gives every row its full path, which is
//! what rows of the published table are matched against.

use crate::diagnostics::{DiagnosticSink, Pass};
use crate::error::Result;
use crate::parser::classify_line;
use crate::table::{PathKey, PathStack, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::BufRead;

/// Rows of the generated table keyed by their full path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LatestMap {
    rows: BTreeMap<PathKey, Row>,
}

impl LatestMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a row, replacing any earlier row with the same path
    pub fn insert(&mut self, key: PathKey, row: Row) -> Option<Row> {
        self.rows.insert(key, row)
    }

    /// Look up the row for a path
    pub fn get(&self, key: &PathKey) -> Option<&Row> {
        self.rows.get(key)
    }

    pub fn contains(&self, key: &PathKey) -> bool {
        self.rows.contains_key(key)
    }

    /// Number of distinct paths
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate paths and rows in path order
    pub fn iter(&self) -> impl Iterator<Item = (&PathKey, &Row)> {
        self.rows.iter()
    }

    /// All paths in path order
    pub fn keys(&self) -> impl Iterator<Item = &PathKey> {
        self.rows.keys()
    }
}

impl FromIterator<(PathKey, Row)> for LatestMap {
    fn from_iter<I: IntoIterator<Item = (PathKey, Row)>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Accumulates rows of one generated table
///
/// Owns the stack for the latest pass; lines must be fed in document order.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    stack: PathStack,
    map: LatestMap,
    line: usize,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next line. Lines that are not rows are reported and skipped.
    pub fn push_line<S: DiagnosticSink>(&mut self, line: &str, sink: &mut S) {
        self.line += 1;

        let parsed = match classify_line(line) {
            Ok(parsed) => parsed,
            Err(rejection) => {
                sink.report(rejection.into_diagnostic(Pass::Latest, self.line));
                return;
            }
        };

        let key = self.stack.open(&parsed.segment);
        tracing::trace!(path = %key, line = self.line, "latest row");
        self.map.insert(key, parsed.row);
    }

    /// Number of lines fed so far
    pub fn lines_read(&self) -> usize {
        self.line
    }

    pub fn finish(self) -> LatestMap {
        self.map
    }
}

/// Build the path map from the full text of a generated table
pub fn build_latest_map<S: DiagnosticSink>(text: &str, sink: &mut S) -> LatestMap {
    let mut builder = TreeBuilder::new();
    for line in text.lines() {
        builder.push_line(line, sink);
    }
    tracing::debug!(lines = builder.lines_read(), "built latest map");
    builder.finish()
}

/// Build the path map from a reader over a generated table
pub fn build_latest_map_from_reader<R: BufRead, S: DiagnosticSink>(
    reader: R,
    sink: &mut S,
) -> Result<LatestMap> {
    let mut builder = TreeBuilder::new();
    for line in reader.lines() {
        builder.push_line(&line?, sink);
    }
    tracing::debug!(lines = builder.lines_read(), "built latest map");
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Diagnostic, DiagnosticKind, IgnoreDiagnostics};

    const GENERATED: &str = "\
| Element | Supported | Notes |
|---|---|---|
| score-partwise | ❌ | root |
| -part | ✅ | parts |
| --measure | ✅ | measures |
| ---note | ✅ | notes |
| ----pitch | ✅ | pitch |
| ---@number | ✅ | attr |
| -part-list | ✅ | list |
";

    #[test]
    fn test_build_nested_paths() {
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let map = build_latest_map(GENERATED, &mut diagnostics);

        assert!(map.contains(&PathKey::from("score-partwise/part/measure/note/pitch")));
        assert!(map.contains(&PathKey::from("score-partwise/part/measure/@number")));
        assert!(map.contains(&PathKey::from("score-partwise/part-list")));
        assert!(map.contains(&PathKey::from("Element")));

        let row = map.get(&PathKey::from("score-partwise/part")).unwrap();
        assert_eq!(row, &Row::new("-part", "✅", "parts"));
    }

    #[test]
    fn test_skipped_lines_are_reported() {
        let text = "\
| Element | Supported | Notes |
|---|---|---|
| score | ❌ | |
| -part | ✅ | parts |
";
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let map = build_latest_map(text, &mut diagnostics);

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].line, 2);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnparseablePathSegment);
        assert_eq!(diagnostics[0].text, "---");
        assert_eq!(diagnostics[1].line, 3);
        assert_eq!(
            diagnostics[1].kind,
            DiagnosticKind::UnclassifiableRow { columns: 2 }
        );
        assert_eq!(diagnostics[1].text, "| score | ❌ | |");
        assert!(diagnostics.iter().all(|d| d.pass == Pass::Latest));

        // without its root row, part hangs off the header entry
        assert!(!map.contains(&PathKey::from("score")));
        assert!(map.contains(&PathKey::from("Element/part")));
    }

    #[test]
    fn test_depth_truncation() {
        let text = "|A|a|a|\n|-B|b|b|\n|--C|c|c|\n|-D|d|d|\n";
        let map = build_latest_map(text, &mut IgnoreDiagnostics);

        assert!(map.contains(&PathKey::from("A/D")));
        assert!(!map.contains(&PathKey::from("A/B/D")));
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn test_duplicate_path_last_wins() {
        let text = "|foo|first|1|\n|foo|second|2|\n";
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        let map = build_latest_map(text, &mut diagnostics);

        assert_eq!(map.len(), 1);
        assert_eq!(
            map.get(&PathKey::from("foo")).unwrap(),
            &Row::new("foo", "second", "2")
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_depth_jump_is_not_validated() {
        let text = "|root|x|x|\n|---deep|y|y|\n";
        let map = build_latest_map(text, &mut IgnoreDiagnostics);
        assert!(map.contains(&PathKey::from("root/deep")));
    }

    #[test]
    fn test_from_reader_matches_text() {
        let from_text = build_latest_map(GENERATED, &mut IgnoreDiagnostics);
        let from_reader =
            build_latest_map_from_reader(GENERATED.as_bytes(), &mut IgnoreDiagnostics).unwrap();
        assert_eq!(from_text, from_reader);
    }

    #[test]
    fn test_map_serializes_as_object() {
        let map: LatestMap = [(PathKey::from("foo"), Row::new("foo-new", "x", "y"))]
            .into_iter()
            .collect();
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["foo"]["columns"][0], "foo-new");
    }
}
