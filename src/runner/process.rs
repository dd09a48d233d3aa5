use super::{
    CompileOutcome, Invocation, Language, LanguageTable, Program, ProgramProvider, RunOutcome,
};
use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Instant;

const MAX_DIAGNOSTIC_BYTES: usize = 4096;

/// Provider backed by a language table; unknown files run directly when they
/// are executable.
#[derive(Debug, Clone)]
pub struct LanguageProvider {
    table: LanguageTable,
}

impl LanguageProvider {
    pub fn new(table: LanguageTable) -> Self {
        Self { table }
    }
}

impl ProgramProvider for LanguageProvider {
    fn program(&self, source: &Path, work_dir: &Path) -> Result<Box<dyn Program>> {
        let language = self.table.for_source(source).cloned();
        let stem = source
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("program");
        Ok(Box::new(LanguageProgram {
            source: source.to_path_buf(),
            binary: work_dir.join(stem),
            work_dir: work_dir.to_path_buf(),
            language,
        }))
    }
}

struct LanguageProgram {
    source: PathBuf,
    binary: PathBuf,
    work_dir: PathBuf,
    language: Option<Language>,
}

impl LanguageProgram {
    fn expand(&self, template: &str) -> Result<Vec<String>> {
        let source = self.source.to_string_lossy();
        let binary = self.binary.to_string_lossy();
        let argv: Vec<String> = shell_words::split(template)
            .with_context(|| format!("parse command template {template:?}"))?
            .into_iter()
            .map(|token| {
                token
                    .replace("{source}", &source)
                    .replace("{binary}", &binary)
            })
            .collect();
        if argv.is_empty() {
            return Err(anyhow!("empty command template"));
        }
        Ok(argv)
    }

    fn run_argv(&self) -> Result<Vec<String>> {
        match &self.language {
            Some(language) => self.expand(&language.run),
            None => Ok(vec![self.source.to_string_lossy().to_string()]),
        }
    }
}

impl Program for LanguageProgram {
    fn compile(&mut self) -> Result<CompileOutcome> {
        if self.source.is_dir() {
            return Ok(CompileOutcome::failed(
                "directory programs are not supported",
            ));
        }
        let Some(language) = self.language.clone() else {
            if is_executable(&self.source) {
                return Ok(CompileOutcome::ok());
            }
            return Ok(CompileOutcome::failed(format!(
                "no language configured for {} and it is not executable",
                self.source.display()
            )));
        };

        if let Some(compile) = &language.compile {
            let argv = self.expand(compile)?;
            if which::which(&argv[0]).is_err() {
                return Ok(CompileOutcome::failed(format!(
                    "{} compiler {:?} not found",
                    language.name, argv[0]
                )));
            }
            let start = Instant::now();
            let output = Command::new(&argv[0])
                .args(&argv[1..])
                .current_dir(&self.work_dir)
                .stdin(Stdio::null())
                .output()
                .with_context(|| format!("spawn {}", argv[0]))?;
            tracing::debug!(
                program = %self.source.display(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "compile finished"
            );
            if !output.status.success() {
                let mut diagnostic = String::from_utf8_lossy(&output.stderr).to_string();
                diagnostic.push_str(&String::from_utf8_lossy(&output.stdout));
                return Ok(CompileOutcome::failed(truncate_string(
                    diagnostic.trim(),
                    MAX_DIAGNOSTIC_BYTES,
                )));
            }
        }

        let run = self.run_argv()?;
        if run[0] != self.binary.to_string_lossy() && which::which(&run[0]).is_err() {
            return Ok(CompileOutcome::failed(format!(
                "{} interpreter {:?} not found",
                language.name, run[0]
            )));
        }
        Ok(CompileOutcome::ok())
    }

    fn run(&self, invocation: &Invocation<'_>) -> Result<RunOutcome> {
        let argv = self.run_argv()?;
        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..]);
        cmd.args(invocation.args);
        cmd.current_dir(invocation.cwd);
        match invocation.stdin {
            Some(path) => {
                let file =
                    File::open(path).with_context(|| format!("open {}", path.display()))?;
                cmd.stdin(file);
            }
            None => {
                cmd.stdin(Stdio::null());
            }
        }
        match invocation.stdout {
            Some(path) => {
                let file =
                    File::create(path).with_context(|| format!("create {}", path.display()))?;
                cmd.stdout(file);
            }
            None => {
                cmd.stdout(Stdio::null());
            }
        }
        cmd.stderr(Stdio::inherit());

        let start = Instant::now();
        let status = cmd
            .status()
            .with_context(|| format!("spawn {}", self.source.display()))?;
        Ok(RunOutcome {
            exit_code: exit_code(&status),
            elapsed: start.elapsed(),
        })
    }
}

#[cfg(unix)]
fn exit_code(status: &ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => -1,
    }
}

#[cfg(not(unix))]
fn exit_code(status: &ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn truncate_string(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        if truncated.len() + ch.len_utf8() > max_bytes {
            break;
        }
        truncated.push(ch);
    }
    truncated
}
