//! Core types for representing indented reference tables

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column separator used by both the generated and the published table
pub const SEPARATOR: char = '|';

/// Separator between segments of a [`PathKey`]
pub const PATH_SEPARATOR: &str = "/";

/// Number of columns a line must have to count as a row
pub const COLUMN_COUNT: usize = 3;

/// A classified table line: exactly three trimmed, non-empty columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Column values, in order
    pub columns: [String; COLUMN_COUNT],
}

impl Row {
    /// Create a new row
    pub fn new(
        first: impl Into<String>,
        second: impl Into<String>,
        third: impl Into<String>,
    ) -> Self {
        Self {
            columns: [first.into(), second.into(), third.into()],
        }
    }

    /// Build a row from split fragments, if there are exactly three
    pub fn from_columns(columns: Vec<String>) -> Option<Self> {
        let columns: [String; COLUMN_COUNT] = columns.try_into().ok()?;
        Some(Self { columns })
    }

    /// The first column, which carries indentation and element name
    pub fn first(&self) -> &str {
        &self.columns[0]
    }

    /// Get a column by index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    /// Replace the first column, keeping the others
    pub fn with_first(&self, first: &str) -> Self {
        let [_, second, third] = &self.columns;
        Self::new(first, second.clone(), third.clone())
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SEPARATOR}")?;
        for column in &self.columns {
            write!(f, "{column}{SEPARATOR}")?;
        }
        Ok(())
    }
}

/// Depth and element identifier taken from a row's first column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    /// Number of leading indentation markers
    pub depth: usize,
    /// Element identifier, `@`-prefixed for attributes
    pub element: String,
}

impl PathSegment {
    pub fn new(depth: usize, element: impl Into<String>) -> Self {
        Self {
            depth,
            element: element.into(),
        }
    }

    /// Whether this segment names an attribute rather than an element
    pub fn is_attribute(&self) -> bool {
        self.element.starts_with('@')
    }
}

/// Canonical joined form of a path, used to match rows across tables
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathKey(String);

impl PathKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PathKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PathKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ancestry of the row currently being read, indexed by depth
///
/// Each parse pass owns one of these. Rows arrive in document order, so
/// truncating to the new row's depth and pushing its identifier is enough to
/// know its full path without building parent links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathStack {
    segments: Vec<String>,
}

impl PathStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a row: drop ancestors at `depth` and deeper, then push its element.
    ///
    /// A depth beyond the current length does not invent missing levels.
    pub fn open(&mut self, segment: &PathSegment) -> PathKey {
        self.segments.truncate(segment.depth);
        self.segments.push(segment.element.clone());
        self.key()
    }

    /// The current path joined into a key
    pub fn key(&self) -> PathKey {
        PathKey(self.segments.join(PATH_SEPARATOR))
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}
