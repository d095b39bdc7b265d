//! Where the latest table text comes from
//!
//! The generated table is produced outside this crate, usually by running a
//! schema transform. This module only fetches its text: from a file that was
//! already built, or by running the generator and capturing its stdout.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A producer of latest-table text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LatestSource {
    /// A pre-generated table file
    File { path: PathBuf },
    /// An external generator whose stdout is the table
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        /// Working directory for the generator
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cwd: Option<PathBuf>,
    },
}

impl LatestSource {
    /// Read the table from a file
    pub fn file(path: impl Into<PathBuf>) -> Self {
        LatestSource::File { path: path.into() }
    }

    /// Run a program and use its stdout
    pub fn command<I, A>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        LatestSource::Command {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
        }
    }

    /// Resolve relative file and working directory paths against `base`
    pub fn resolve_against(&mut self, base: &Path) {
        match self {
            LatestSource::File { path } => {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
            LatestSource::Command { cwd, .. } => {
                if let Some(dir) = cwd {
                    if dir.is_relative() {
                        *dir = base.join(&*dir);
                    }
                }
            }
        }
    }

    /// Produce the latest table text
    pub fn load(&self) -> Result<String> {
        match self {
            LatestSource::File { path } => {
                tracing::debug!(path = %path.display(), "reading latest table");
                fs::read_to_string(path).map_err(|e| Error::FileRead {
                    path: path.clone(),
                    source: e,
                })
            }
            LatestSource::Command { program, args, cwd } => {
                run_generator(program, args, cwd.as_deref())
            }
        }
    }
}

fn run_generator(program: &str, args: &[String], cwd: Option<&Path>) -> Result<String> {
    tracing::debug!(program, ?args, "running table generator");

    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let output = command.output().map_err(|e| Error::Generator {
        program: program.to_string(),
        message: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(Error::GeneratorStatus {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    String::from_utf8(output.stdout).map_err(|e| Error::Generator {
        program: program.to_string(),
        message: format!("output is not UTF-8: {}", e),
    })
}
