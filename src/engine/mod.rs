//! Execution engine: materializes a manifest into the data tree.
//!
//! The walk is depth first in manifest order. Every generation unit runs in its
//! own staging directory inside the run workspace and is published with a
//! remove-then-move, so a failing generator never leaves partial output in the
//! data tree. After a group's declared units are done, the directory is
//! rescanned so undeclared `.in` files still receive their extensions.
mod chain;
mod merge;

use crate::fsutil::{ensure_directory, replace_path, sorted_entries, with_extension};
use crate::generator::GeneratorCache;
use crate::manifest::{Config, Group, LiteralDocument, Manifest, Node, Target, Testcase};
use crate::problem::ProblemPaths;
use crate::runner::ProgramProvider;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use chain::{execute_chain, ChainRun};
use merge::collect_adoptions;

/// Counts of what a generation run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Single-file testcases whose `.in` was generated.
    pub testcases: usize,
    /// Group generators that ran.
    pub group_generators: usize,
    /// Extension files derived from `.in` files.
    pub extensions: usize,
    /// Literal documents written.
    pub documents: usize,
    /// Distinct generator programs compiled.
    pub compiled: usize,
}

/// A private directory for one generation unit, removed when dropped.
struct Staging {
    dir: TempDir,
}

impl Staging {
    fn new(workspace: &Path, label: &str) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{label}-"))
            .tempdir_in(workspace)
            .context("create staging dir")?;
        fs::create_dir(dir.path().join("gen")).context("create staging gen dir")?;
        Ok(Self { dir })
    }

    /// Scratch space for chain intermediates; never published.
    fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Working directory of the generators; its contents are what gets published.
    fn gen_dir(&self) -> PathBuf {
        self.dir.path().join("gen")
    }
}

/// Walks a manifest and drives generators, owning the run's generator cache.
pub struct Engine<'a> {
    paths: &'a ProblemPaths,
    data_dir: PathBuf,
    workspace: &'a Path,
    cache: GeneratorCache<'a>,
    report: GenerationReport,
}

impl<'a> Engine<'a> {
    /// Create an engine staging everything under `workspace`.
    pub fn new(
        paths: &'a ProblemPaths,
        provider: &'a dyn ProgramProvider,
        workspace: &'a Path,
    ) -> Self {
        Self {
            paths,
            data_dir: paths.data_dir(),
            workspace,
            cache: GeneratorCache::new(provider, workspace),
            report: GenerationReport::default(),
        }
    }

    /// Materialize the whole manifest. The first fatal error aborts the walk.
    pub fn generate(mut self, manifest: &Manifest) -> Result<GenerationReport> {
        self.generate_group(manifest.root())?;
        self.report.compiled = self.cache.compile_count();
        Ok(self.report)
    }

    fn target(&self, rel: &str) -> PathBuf {
        if rel.is_empty() {
            self.data_dir.clone()
        } else {
            self.data_dir.join(rel)
        }
    }

    fn generate_group(&mut self, group: &Group) -> Result<()> {
        let dir = self.target(&group.path);
        ensure_directory(&dir, true)?;

        for child in &group.children {
            match child {
                Node::Group(inner) => self.generate_group(inner)?,
                Node::LiteralDocument(document) => self.write_document(document)?,
                Node::Testcase(testcase) => match testcase.target {
                    Target::File => self.generate_file(testcase, &group.config)?,
                    Target::Directory => self.generate_directory(testcase, &group.config)?,
                },
            }
        }

        let declared: HashSet<String> = group
            .children
            .iter()
            .map(|child| child.path().to_string())
            .collect();
        self.scan_undeclared(&dir, &group.path, &declared, &group.config)
    }

    fn write_document(&mut self, document: &LiteralDocument) -> Result<()> {
        let Some(text) = document.render()? else {
            return Ok(());
        };
        let path = self.target(&document.path);
        fs::write(&path, text).with_context(|| format!("write {}", path.display()))?;
        self.report.documents += 1;
        tracing::info!(path = %document.path, "wrote literal document");
        Ok(())
    }

    fn generate_file(&mut self, testcase: &Testcase, config: &Config) -> Result<()> {
        let target_path = self.target(&testcase.path);
        if let Some(chain) = &testcase.generator {
            let staging = Staging::new(self.workspace, &testcase.name)?;
            let generators_dir = self.paths.generators_dir();
            let output = execute_chain(
                &mut self.cache,
                chain,
                &ChainRun {
                    base_dir: &generators_dir,
                    target: testcase.base_path(),
                    scratch: staging.root(),
                    cwd: &staging.gen_dir(),
                    input: None,
                },
            )
            .with_context(|| format!("generate /{}", testcase.path))?;
            replace_path(&output, &target_path)?;
            self.report.testcases += 1;
            tracing::info!(path = %testcase.path, "generated testcase");
        }

        if target_path.is_file() {
            self.generate_extensions(&target_path, testcase.base_path(), config)
        } else {
            tracing::warn!(path = %testcase.path, "manual testcase is missing");
            Ok(())
        }
    }

    fn generate_directory(&mut self, testcase: &Testcase, config: &Config) -> Result<()> {
        let target_dir = self.target(&testcase.path);
        ensure_directory(&target_dir, true)?;
        let Some(chain) = &testcase.generator else {
            return self.scan_undeclared(&target_dir, &testcase.path, &HashSet::new(), config);
        };

        let staging = Staging::new(self.workspace, &testcase.name)?;
        let gen_dir = staging.gen_dir();
        let generators_dir = self.paths.generators_dir();
        let output = execute_chain(
            &mut self.cache,
            chain,
            &ChainRun {
                base_dir: &generators_dir,
                target: testcase.base_path(),
                scratch: staging.root(),
                cwd: &gen_dir,
                input: None,
            },
        )
        .with_context(|| format!("generate /{}", testcase.path))?;
        fs::remove_file(&output).with_context(|| format!("remove {}", output.display()))?;

        let mut publish = Vec::new();
        let mut extended = HashSet::new();
        for rel in collect_adoptions(&gen_dir, config)? {
            if rel.extension().is_some_and(|ext| ext == "in") {
                let base = rel.with_extension("");
                let target = format!("{}/{}", testcase.path, slash_path(&base));
                extended.insert(format!("{target}.in"));
                for ext in self
                    .derive_extensions(&gen_dir.join(&rel), &target, config, staging.root())
                    .with_context(|| format!("generate extensions for /{target}.in"))?
                {
                    publish.push(with_extension(&rel, &ext));
                }
            }
            publish.push(rel);
        }

        for rel in &publish {
            let dest = target_dir.join(rel);
            if let Some(parent) = dest.parent() {
                ensure_directory(parent, true)?;
            }
            replace_path(&gen_dir.join(rel), &dest)?;
        }
        self.report.group_generators += 1;
        tracing::info!(
            path = %testcase.path,
            files = publish.len(),
            "merged group generator output"
        );
        // Inputs left over from earlier runs or written by hand still need extensions.
        self.scan_undeclared(&target_dir, &testcase.path, &extended, config)
    }

    /// Derive extensions for a `.in` file already in the data tree, staging a
    /// copy of it and its externally generated siblings first.
    fn generate_extensions(
        &mut self,
        in_path: &Path,
        target: &str,
        config: &Config,
    ) -> Result<()> {
        if config.newly_generated().is_empty() {
            return Ok(());
        }
        let file_name = in_path
            .file_name()
            .with_context(|| format!("testcase path {} has no file name", in_path.display()))?;
        let label = file_name.to_string_lossy().to_string();
        let staging = Staging::new(self.workspace, &format!("{label}-ext"))?;
        let gen_dir = staging.gen_dir();
        let staged_in = gen_dir.join(file_name);

        let mut carried = Vec::new();
        for ext in std::iter::once("in").chain(config.externally_generated()) {
            let source = with_extension(in_path, ext);
            if source.is_file() {
                fs::copy(&source, with_extension(&staged_in, ext))
                    .with_context(|| format!("stage {}", source.display()))?;
                carried.push(ext.to_string());
            }
        }

        let produced = self
            .derive_extensions(&staged_in, target, config, staging.root())
            .with_context(|| format!("generate extensions for /{target}.in"))?;

        for ext in carried.iter().chain(produced.iter()) {
            replace_path(
                &with_extension(&staged_in, ext),
                &with_extension(in_path, ext),
            )?;
        }
        Ok(())
    }

    /// Run every newly generated extension of `staged_in` in place, `ans` first,
    /// and return the extensions produced.
    fn derive_extensions(
        &mut self,
        staged_in: &Path,
        target: &str,
        config: &Config,
        scratch: &Path,
    ) -> Result<Vec<String>> {
        let cwd = staged_in
            .parent()
            .with_context(|| format!("staged file {} has no parent", staged_in.display()))?;
        let mut produced = Vec::new();
        for (ext, chain) in config.newly_generated() {
            let output = execute_chain(
                &mut self.cache,
                chain,
                &ChainRun {
                    base_dir: self.paths.root(),
                    target,
                    scratch,
                    cwd,
                    input: Some(staged_in),
                },
            )?;
            replace_path(&output, &with_extension(staged_in, ext))?;
            produced.push(ext.to_string());
            self.report.extensions += 1;
            tracing::debug!(target, ext, "generated extension");
        }
        Ok(produced)
    }

    /// Post-order pass over `dir`: every `.in` whose data-relative path is not
    /// in `skip` gets its extensions, and subdirectories not in `skip` are
    /// scanned the same way.
    fn scan_undeclared(
        &mut self,
        dir: &Path,
        rel: &str,
        skip: &HashSet<String>,
        config: &Config,
    ) -> Result<()> {
        for entry in sorted_entries(dir)? {
            let Some(name) = entry.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let child_rel = if rel.is_empty() {
                name.to_string()
            } else {
                format!("{rel}/{name}")
            };
            if skip.contains(&child_rel) {
                continue;
            }
            if entry.is_dir() {
                self.scan_undeclared(&entry, &child_rel, skip, config)?;
            } else if entry.is_file() && name != ".in" {
                if let Some(base) = child_rel.strip_suffix(".in") {
                    tracing::debug!(path = %child_rel, "extending undeclared testcase");
                    self.generate_extensions(&entry, base, config)?;
                }
            }
        }
        Ok(())
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
