//! Line merger: refresh the first column of a published table from the latest one
//!
//! The published table is streamed line by line. Every line produces exactly
//! one output line, either a rebuilt row or the input line untouched.

use crate::diagnostics::{DiagnosticSink, Pass};
use crate::error::Result;
use crate::parser::classify_line;
use crate::table::{PathKey, PathStack, Row};
use crate::tree::LatestMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{BufRead, Write};

/// What happened to one line of the published table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineOutcome {
    /// Matched, and the first column took the latest text
    Replaced,
    /// Matched, first column already equal to the latest text
    UpToDate,
    /// A row whose path the latest table does not have
    Unmatched,
    /// Not a row at all
    Passthrough,
}

/// Counters for one merge pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Lines read, equal to lines written
    pub lines: usize,
    pub replaced: usize,
    pub up_to_date: usize,
    pub unmatched: usize,
    pub passthrough: usize,
    /// Latest paths that no row of the published table matched, in path order
    pub unvisited: Vec<PathKey>,
}

impl MergeSummary {
    fn record(&mut self, outcome: LineOutcome) {
        self.lines += 1;
        match outcome {
            LineOutcome::Replaced => self.replaced += 1,
            LineOutcome::UpToDate => self.up_to_date += 1,
            LineOutcome::Unmatched => self.unmatched += 1,
            LineOutcome::Passthrough => self.passthrough += 1,
        }
    }

    /// Rows that found their path in the latest table
    pub fn matched(&self) -> usize {
        self.replaced + self.up_to_date
    }
}

/// Output for one input line, without its terminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergedLine<'a> {
    /// A rebuilt row
    Row(Row),
    /// The input line, unchanged
    Original(&'a str),
}

impl MergedLine<'_> {
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            MergedLine::Row(row) => write!(writer, "{row}"),
            MergedLine::Original(line) => writer.write_all(line.as_bytes()),
        }
    }

    fn push_to(&self, out: &mut String) {
        match self {
            MergedLine::Row(row) => out.push_str(&row.to_string()),
            MergedLine::Original(line) => out.push_str(line),
        }
    }
}

/// Merge state for one pass over a published table
///
/// Owns its own [`PathStack`]; the latest map is only read.
#[derive(Debug)]
pub struct LineMerger<'m> {
    latest: &'m LatestMap,
    stack: PathStack,
    visited: HashSet<PathKey>,
    summary: MergeSummary,
}

impl<'m> LineMerger<'m> {
    pub fn new(latest: &'m LatestMap) -> Self {
        Self {
            latest,
            stack: PathStack::new(),
            visited: HashSet::new(),
            summary: MergeSummary::default(),
        }
    }

    /// Merge the next line (without its terminator)
    pub fn merge_line<'l, S: DiagnosticSink>(
        &mut self,
        line: &'l str,
        sink: &mut S,
    ) -> (MergedLine<'l>, LineOutcome) {
        let line_number = self.summary.lines + 1;

        let (merged, outcome) = match classify_line(line) {
            Err(rejection) => {
                sink.report(rejection.into_diagnostic(Pass::Existing, line_number));
                (MergedLine::Original(line), LineOutcome::Passthrough)
            }
            Ok(parsed) => {
                let key = self.stack.open(&parsed.segment);
                match self.latest.get(&key) {
                    Some(latest) => {
                        let outcome = if latest.first() == parsed.row.first() {
                            LineOutcome::UpToDate
                        } else {
                            LineOutcome::Replaced
                        };
                        tracing::debug!(path = %key, line = line_number, ?outcome, "matched row");
                        self.visited.insert(key);
                        (MergedLine::Row(parsed.row.with_first(latest.first())), outcome)
                    }
                    None => {
                        tracing::debug!(path = %key, line = line_number, "no latest row");
                        (MergedLine::Original(line), LineOutcome::Unmatched)
                    }
                }
            }
        };

        self.summary.record(outcome);
        (merged, outcome)
    }

    /// Lines merged so far
    pub fn lines(&self) -> usize {
        self.summary.lines
    }

    /// Close the pass and compute the unvisited latest paths
    pub fn finish(self) -> MergeSummary {
        let mut summary = self.summary;
        summary.unvisited = self
            .latest
            .keys()
            .filter(|key| !self.visited.contains(*key))
            .cloned()
            .collect();
        summary
    }
}

/// Split a raw line into content and its `\n` or `\r\n` terminator
fn split_terminator(raw: &str) -> (&str, &str) {
    if let Some(content) = raw.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = raw.strip_suffix('\n') {
        (content, "\n")
    } else {
        (raw, "")
    }
}

/// Stream a published table from `reader` to `writer`, merging as it goes
///
/// Each output line keeps the terminator of its input line. Only I/O errors
/// stop the pass; unusable lines are passed through and reported to `sink`.
pub fn merge_lines<R, W, S>(
    mut reader: R,
    mut writer: W,
    latest: &LatestMap,
    sink: &mut S,
) -> Result<MergeSummary>
where
    R: BufRead,
    W: Write,
    S: DiagnosticSink,
{
    let mut merger = LineMerger::new(latest);
    let mut buf = String::new();

    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            break;
        }
        let (content, terminator) = split_terminator(&buf);
        let (merged, _) = merger.merge_line(content, sink);
        merged.write_to(&mut writer)?;
        writer.write_all(terminator.as_bytes())?;
    }
    writer.flush()?;

    let summary = merger.finish();
    tracing::debug!(
        lines = summary.lines,
        replaced = summary.replaced,
        unmatched = summary.unmatched,
        passthrough = summary.passthrough,
        "merge finished"
    );
    Ok(summary)
}

/// Merge an in-memory published table
pub fn merge_str<S: DiagnosticSink>(
    existing: &str,
    latest: &LatestMap,
    sink: &mut S,
) -> (String, MergeSummary) {
    let mut merger = LineMerger::new(latest);
    let mut out = String::with_capacity(existing.len());

    for raw in existing.split_inclusive('\n') {
        let (content, terminator) = split_terminator(raw);
        let (merged, _) = merger.merge_line(content, sink);
        merged.push_to(&mut out);
        out.push_str(terminator);
    }

    (out, merger.finish())
}
