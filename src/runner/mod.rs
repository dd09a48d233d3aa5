//! Program runner collaborator.
//!
//! The engine only ever compiles a program once and then runs it with
//! arguments and optional stdin/stdout files; everything about languages and
//! process spawning lives behind these traits.
mod languages;
mod process;

use anyhow::Result;
use std::path::Path;
use std::time::Duration;

pub use languages::{load_language_table, Language, LanguageTable, DEFAULT_LANGUAGES_YAML};
pub use process::LanguageProvider;

/// Outcome of compiling a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutcome {
    pub success: bool,
    pub diagnostic: String,
}

impl CompileOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            diagnostic: String::new(),
        }
    }

    pub fn failed(diagnostic: impl Into<String>) -> Self {
        Self {
            success: false,
            diagnostic: diagnostic.into(),
        }
    }
}

/// One execution request.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub args: &'a [String],
    /// File connected to the program's stdin, if any.
    pub stdin: Option<&'a Path>,
    /// File receiving the program's stdout, if any.
    pub stdout: Option<&'a Path>,
    /// Working directory for the process.
    pub cwd: &'a Path,
}

/// Outcome of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub exit_code: i32,
    pub elapsed: Duration,
}

/// A compiled-or-interpreted program that can be run repeatedly.
pub trait Program {
    fn compile(&mut self) -> Result<CompileOutcome>;
    fn run(&self, invocation: &Invocation<'_>) -> Result<RunOutcome>;
}

/// Maps a program path to a runnable program.
pub trait ProgramProvider {
    /// Build a program for `source`; `work_dir` is private to this program for
    /// the lifetime of the run.
    fn program(&self, source: &Path, work_dir: &Path) -> Result<Box<dyn Program>>;
}
