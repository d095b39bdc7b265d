//! tm-core: Core library for merging indentation-encoded reference tables
//!
//! This library provides functionality to:
//! - Classify `|`-separated table lines into rows and read their indented element path
//! - Build a path map from a freshly generated table
//! - Stream a published table, refreshing the first column of rows whose path matches
//!   while keeping every other column and every unusable line as it was
//! - Fetch the generated table from a file or an external generator

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod merger;
pub mod parser;
pub mod source;
pub mod table;
pub mod tree;

pub use config::MergeConfig;
pub use diagnostics::{
    Diagnostic, DiagnosticKind, DiagnosticSink, IgnoreDiagnostics, Pass, TracingSink,
};
pub use error::{Error, Result};
pub use merger::{merge_lines, merge_str, LineMerger, LineOutcome, MergeSummary, MergedLine};
pub use parser::{classify_line, parse_segment, split_columns, ParsedRow, Rejection};
pub use source::LatestSource;
pub use table::{PathKey, PathSegment, PathStack, Row};
pub use tree::{build_latest_map, build_latest_map_from_reader, LatestMap, TreeBuilder};
