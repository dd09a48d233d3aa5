//! Per-run generator cache.
//!
//! Each distinct program path is compiled at most once per run; later
//! references reuse the compiled handle. The cache is plain memoization and is
//! owned by the run context.
use crate::error::GenError;
use crate::runner::{Invocation, Program, ProgramProvider};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A compiled program plus the private directory it was compiled in.
pub struct GeneratorHandle {
    path: PathBuf,
    program: Box<dyn Program>,
    _work_dir: TempDir,
}

impl GeneratorHandle {
    /// Absolute path identifying this generator.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the generator; a non-zero exit is fatal and carries `command`.
    pub fn run(&self, command: &str, invocation: &Invocation<'_>) -> Result<()> {
        let outcome = self
            .program
            .run(invocation)
            .with_context(|| format!("run generator {}", self.path.display()))?;
        tracing::debug!(
            command,
            exit_code = outcome.exit_code,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "generator finished"
        );
        if outcome.exit_code != 0 {
            return Err(GenError::GeneratorExit {
                command: command.to_string(),
                code: outcome.exit_code,
            }
            .into());
        }
        Ok(())
    }
}

/// Memoized generator handles keyed by absolute program path.
pub struct GeneratorCache<'p> {
    provider: &'p dyn ProgramProvider,
    workspace: PathBuf,
    handles: HashMap<PathBuf, GeneratorHandle>,
    compiles: usize,
}

impl<'p> GeneratorCache<'p> {
    /// Create a cache whose compile directories live under `workspace`.
    pub fn new(provider: &'p dyn ProgramProvider, workspace: &Path) -> Self {
        Self {
            provider,
            workspace: workspace.to_path_buf(),
            handles: HashMap::new(),
            compiles: 0,
        }
    }

    /// Return the handle for `path`, compiling it on first use.
    pub fn get(&mut self, path: &Path) -> Result<&GeneratorHandle> {
        let key = if path.exists() {
            path.canonicalize()
                .with_context(|| format!("resolve generator {}", path.display()))?
        } else {
            return Err(GenError::ProgramNotFound {
                path: path.to_path_buf(),
            }
            .into());
        };

        if !self.handles.contains_key(&key) {
            let handle = self.compile(&key)?;
            self.handles.insert(key.clone(), handle);
        }
        self.handles
            .get(&key)
            .with_context(|| format!("generator cache lost {}", key.display()))
    }

    /// Number of compilations performed so far.
    pub fn compile_count(&self) -> usize {
        self.compiles
    }

    fn compile(&mut self, path: &Path) -> Result<GeneratorHandle> {
        let work_dir = tempfile::Builder::new()
            .prefix("generator-")
            .tempdir_in(&self.workspace)
            .context("create generator work dir")?;
        let mut program = self.provider.program(path, work_dir.path())?;
        let outcome = program
            .compile()
            .with_context(|| format!("compile {}", path.display()))?;
        self.compiles += 1;
        if !outcome.success {
            return Err(GenError::Compile {
                program: path.to_path_buf(),
                diagnostic: outcome.diagnostic,
            }
            .into());
        }
        tracing::info!(program = %path.display(), "compiled generator");
        Ok(GeneratorHandle {
            path: path.to_path_buf(),
            program,
            _work_dir: work_dir,
        })
    }
}
