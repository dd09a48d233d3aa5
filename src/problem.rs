//! Typed paths into a problem package.
//!
//! Centralizing path construction keeps the engine, the cleaner and the
//! generator cache agreeing on where things live.
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// Manifest location relative to the generator directory.
pub const MANIFEST_FILE: &str = "gen.yaml";
/// Optional per-problem language table relative to the generator directory.
pub const LANGUAGES_FILE: &str = "languages.yaml";

/// Convenience wrapper for locating the parts of a problem package.
#[derive(Debug, Clone)]
pub struct ProblemPaths {
    root: PathBuf,
}

impl ProblemPaths {
    /// Create a path helper rooted at the problem directory.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve the problem directory and check that the generator inputs exist.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(anyhow!("problem directory '{}' not found", path.display()));
        }
        let root = path
            .canonicalize()
            .with_context(|| format!("resolve problem directory {}", path.display()))?;
        let paths = Self::new(root);
        if !paths.generators_dir().is_dir() {
            return Err(anyhow!(
                "generator directory '{}' not found",
                paths.generators_dir().display()
            ));
        }
        if !paths.manifest_path().is_file() {
            return Err(anyhow!(
                "generator manifest '{}' not found",
                paths.manifest_path().display()
            ));
        }
        Ok(paths)
    }

    /// Return the problem directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the problem's short name (its directory name).
    pub fn short_name(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "problem".to_string())
    }

    /// Return the `data/` tree that generation writes into.
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Return the `generators/` directory.
    pub fn generators_dir(&self) -> PathBuf {
        self.root.join("generators")
    }

    /// Return the `generators/gen.yaml` manifest path.
    pub fn manifest_path(&self) -> PathBuf {
        self.generators_dir().join(MANIFEST_FILE)
    }

    /// Return the `generators/languages.yaml` override path.
    pub fn languages_path(&self) -> PathBuf {
        self.generators_dir().join(LANGUAGES_FILE)
    }
}
