//! In-process stand-ins for generator programs, keyed by file name.
use crate::runner::{CompileOutcome, Invocation, Program, ProgramProvider, RunOutcome};
use anyhow::{Context, Result};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

/// Every program name the fake knows how to run.
pub(crate) const FAKE_PROGRAMS: &[&str] = &["echo", "upper", "fail", "sol", "viz", "tree"];

/// Hands out fake programs and records each run as `"name arg arg"`.
#[derive(Default)]
pub(crate) struct FakeProvider {
    pub calls: Rc<RefCell<Vec<String>>>,
}

impl FakeProvider {
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl ProgramProvider for FakeProvider {
    fn program(&self, source: &Path, _work_dir: &Path) -> Result<Box<dyn Program>> {
        let name = source
            .file_name()
            .and_then(|name| name.to_str())
            .context("fake program without a name")?
            .to_string();
        Ok(Box::new(FakeProgram {
            name,
            calls: Rc::clone(&self.calls),
        }))
    }
}

struct FakeProgram {
    name: String,
    calls: Rc<RefCell<Vec<String>>>,
}

impl FakeProgram {
    fn write_stdout(&self, invocation: &Invocation<'_>, text: &str) -> Result<()> {
        if let Some(stdout) = invocation.stdout {
            fs::write(stdout, text)?;
        }
        Ok(())
    }

    fn read_stdin(&self, invocation: &Invocation<'_>) -> Result<String> {
        match invocation.stdin {
            Some(stdin) => Ok(fs::read_to_string(stdin)?),
            None => Ok(String::new()),
        }
    }
}

impl Program for FakeProgram {
    fn compile(&mut self) -> Result<CompileOutcome> {
        if FAKE_PROGRAMS.contains(&self.name.as_str()) {
            Ok(CompileOutcome::ok())
        } else {
            Ok(CompileOutcome::failed(format!("unknown fake {}", self.name)))
        }
    }

    fn run(&self, invocation: &Invocation<'_>) -> Result<RunOutcome> {
        let mut call = vec![self.name.clone()];
        call.extend(invocation.args.iter().cloned());
        self.calls.borrow_mut().push(call.join(" "));

        let mut exit_code = 0;
        match self.name.as_str() {
            "echo" => self.write_stdout(invocation, &format!("{}\n", invocation.args.join(" ")))?,
            "upper" => {
                let text = self.read_stdin(invocation)?.to_uppercase();
                self.write_stdout(invocation, &text)?;
            }
            "fail" => exit_code = 3,
            "sol" => {
                let text = self.read_stdin(invocation)?;
                self.write_stdout(invocation, &format!("ans:{text}"))?;
            }
            "viz" => {
                let answer = invocation
                    .stdin
                    .and_then(Path::file_stem)
                    .map(|stem| invocation.cwd.join(stem).with_extension("ans"));
                let seen = answer.is_some_and(|path| path.is_file());
                self.write_stdout(invocation, if seen { "viz:ans" } else { "viz:none" })?;
            }
            "tree" => {
                for (name, text) in [
                    ("1.in", "one"),
                    ("1.ans", "one-ans"),
                    ("2.in", "two"),
                    ("3.ans", "orphan"),
                    ("stray.txt", "stray"),
                    ("sub/4.in", "four"),
                ] {
                    let path = invocation.cwd.join(name);
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(path, text)?;
                }
                self.write_stdout(invocation, "tree stdout")?;
            }
            other => anyhow::bail!("unknown fake program {other}"),
        }
        Ok(RunOutcome {
            exit_code,
            elapsed: Duration::ZERO,
        })
    }
}

/// Create a problem package in a temp dir with every fake program present.
pub(crate) fn problem_with_manifest(manifest: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path().join("demo");
    let generators = root.join("generators");
    fs::create_dir_all(&generators).expect("create generators dir");
    for name in FAKE_PROGRAMS {
        fs::write(generators.join(name), "").expect("write fake program");
    }
    fs::write(generators.join("gen.yaml"), manifest).expect("write manifest");
    (temp, root)
}
