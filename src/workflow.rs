//! Top-level generate and clean runs over one problem package.
use crate::clean::{clean, CleanReport};
use crate::engine::{Engine, GenerationReport};
use crate::manifest;
use crate::problem::ProblemPaths;
use crate::runner::{load_language_table, LanguageProvider, ProgramProvider};
use anyhow::{Context, Result};
use std::time::Instant;

/// Generate the data tree of the problem at `paths` with the default runner.
pub fn run_generate(paths: &ProblemPaths) -> Result<GenerationReport> {
    let table = load_language_table(&paths.languages_path())?;
    let provider = LanguageProvider::new(table);
    generate_with(paths, &provider)
}

/// Generate with an explicit program provider.
///
/// The manifest is fully loaded and checked before anything is written. All
/// staging lives in one workspace that is removed on every exit path.
pub fn generate_with(
    paths: &ProblemPaths,
    provider: &dyn ProgramProvider,
) -> Result<GenerationReport> {
    let manifest = manifest::load_file(&paths.manifest_path())?;
    let workspace = tempfile::Builder::new()
        .prefix(&format!("gendata-{}-", paths.short_name()))
        .tempdir()
        .context("create run workspace")?;
    tracing::info!(
        problem = %paths.root().display(),
        workspace = %workspace.path().display(),
        "generating test data"
    );

    let started = Instant::now();
    let report = Engine::new(paths, provider, workspace.path()).generate(&manifest)?;
    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        testcases = report.testcases,
        extensions = report.extensions,
        "generation complete"
    );
    Ok(report)
}

/// Remove generated data of the problem at `paths`.
///
/// Only a broken manifest is fatal; deletion failures come back as warnings.
pub fn run_clean(paths: &ProblemPaths) -> Result<CleanReport> {
    let manifest = manifest::load_file(&paths.manifest_path())?;
    let report = clean(&manifest, &paths.data_dir());
    tracing::info!(
        files = report.files_removed,
        dirs = report.dirs_removed,
        warnings = report.warnings.len(),
        "clean complete"
    );
    Ok(report)
}
