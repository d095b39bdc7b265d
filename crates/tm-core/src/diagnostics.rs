//! Side-channel reports for lines that could not be used as rows
//!
//! Diagnostics never reach the merged output and never change the outcome of
//! a run. Where they end up is decided by the [`DiagnosticSink`] the caller
//! passes in.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which table a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pass {
    /// The freshly generated table
    Latest,
    /// The published table being merged into
    Existing,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Latest => write!(f, "Latest"),
            Pass::Existing => write!(f, "Existing"),
        }
    }
}

/// Why a line was skipped or passed through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Column count after splitting was not three
    UnclassifiableRow { columns: usize },
    /// The first column did not look like an indented element name
    UnparseablePathSegment,
}

/// A report about one line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub pass: Pass,
    /// 1-based line number in the pass's input
    pub line: usize,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
    /// The offending raw text: the whole line, or the first column
    pub text: String,
}

impl Diagnostic {
    pub fn new(pass: Pass, line: usize, kind: DiagnosticKind, text: impl Into<String>) -> Self {
        Self {
            pass,
            line,
            kind,
            text: text.into(),
        }
    }

    /// What happened to the line
    pub fn action(&self) -> &'static str {
        match self.pass {
            Pass::Latest => "Skipping",
            Pass::Existing => "Passing through",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: No match for \"{}\". {}.",
            self.pass,
            self.text,
            self.action()
        )
    }
}

/// Receiver for diagnostics produced while parsing tables
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Collects diagnostics in memory
impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Drops every diagnostic
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreDiagnostics;

impl DiagnosticSink for IgnoreDiagnostics {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

/// Emits each diagnostic as a `tracing` warning and keeps a count
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink {
    pub reported: usize,
}

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.reported += 1;
        tracing::warn!(
            pass = %diagnostic.pass,
            line = diagnostic.line,
            "{}",
            diagnostic
        );
    }
}
