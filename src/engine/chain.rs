use crate::command::{interpolate, CommandChain, InterpolationContext, Step};
use crate::error::GenError;
use crate::fsutil::{remove_if_exists, set_output_permissions};
use crate::generator::GeneratorCache;
use crate::runner::Invocation;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const STEP_OUTPUT: &str = "_tmp_output";
const STEP_INPUT: &str = "_tmp_input";

/// Where and how one command chain runs.
pub(super) struct ChainRun<'r> {
    /// Directory program and copy paths are resolved against.
    pub base_dir: &'r Path,
    /// Value substituted for `$PATH`.
    pub target: &'r str,
    /// Private scratch directory for the intermediate files.
    pub scratch: &'r Path,
    /// Working directory of every step.
    pub cwd: &'r Path,
    /// Input of the first step, if any.
    pub input: Option<&'r Path>,
}

/// Run each step with the previous step's output as its stdin and return the
/// path of the last output, which lives in `scratch`.
pub(super) fn execute_chain(
    cache: &mut GeneratorCache<'_>,
    chain: &CommandChain,
    run: &ChainRun<'_>,
) -> Result<PathBuf> {
    let context = InterpolationContext {
        base_dir: run.base_dir,
        target: run.target,
    };
    let output = run.scratch.join(STEP_OUTPUT);
    let carried = run.scratch.join(STEP_INPUT);
    let mut input = run.input.map(Path::to_path_buf);

    for template in chain.commands() {
        let interpolated = interpolate(template, &context)?;
        remove_if_exists(&output)?;
        match &interpolated.step {
            Step::Copy { source } => {
                if !source.is_file() {
                    return Err(GenError::ProgramNotFound {
                        path: source.clone(),
                    }
                    .into());
                }
                fs::copy(source, &output)
                    .with_context(|| format!("copy {}", source.display()))?;
            }
            Step::Program { program, args } => {
                let handle = cache.get(program)?;
                tracing::info!(
                    command = template.original(),
                    seed = interpolated.seed,
                    target = run.target,
                    "running generator"
                );
                handle.run(
                    template.original(),
                    &Invocation {
                        args,
                        stdin: input.as_deref(),
                        stdout: Some(&output),
                        cwd: run.cwd,
                    },
                )?;
            }
        }
        if !output.exists() {
            fs::write(&output, b"").with_context(|| format!("create {}", output.display()))?;
        }
        set_output_permissions(&output)?;
        remove_if_exists(&carried)?;
        fs::rename(&output, &carried)
            .with_context(|| format!("move {} to {}", output.display(), carried.display()))?;
        input = Some(carried.clone());
    }
    Ok(carried)
}
