//! Shared test infrastructure for integration tests.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A throwaway problem package with shell generators.
pub struct ProblemFixture {
    _temp: TempDir,
    pub root: PathBuf,
}

impl ProblemFixture {
    /// Create `<tmp>/demo` with `generators/gen.yaml` set to `manifest`.
    pub fn new(manifest: &str) -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let root = temp.path().join("demo");
        fs::create_dir_all(root.join("generators")).expect("create generators dir");
        fs::write(root.join("generators/gen.yaml"), manifest).expect("write manifest");
        Self { _temp: temp, root }
    }

    /// Write a file relative to the problem root, creating parents.
    pub fn write(&self, rel: &str, text: &str) {
        let path = self.root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
        fs::write(path, text).expect("write fixture file");
    }

    pub fn data(&self, rel: &str) -> PathBuf {
        self.root.join("data").join(rel)
    }

    #[allow(dead_code)]
    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.data(rel)).unwrap_or_else(|err| panic!("read {rel}: {err}"))
    }

    /// Run the `gendata` binary on this problem with extra flags.
    pub fn run(&self, flags: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_gendata"))
            .args(flags)
            .arg(&self.root)
            .env_remove("GENDATA_LOG")
            .output()
            .expect("run gendata")
    }
}

/// Skip when no `sh` is available to run the shell generators.
pub fn skip_without_sh() -> bool {
    if find_in_path("sh").is_none() {
        eprintln!("Skipping: sh not available");
        return true;
    }
    false
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_file(candidate))
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|meta| meta.is_file()).unwrap_or(false)
}

/// List every file below `dir`, relative and sorted.
pub fn list_files(dir: &Path) -> Vec<String> {
    let mut files = Vec::new();
    collect(dir, dir, &mut files);
    files.sort();
    files
}

fn collect(root: &Path, dir: &Path, files: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries {
        let path = entry.expect("dir entry").path();
        if path.is_dir() {
            collect(root, &path, files);
        } else {
            let rel = path.strip_prefix(root).expect("relative path");
            files.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
}
