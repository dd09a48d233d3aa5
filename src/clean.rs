//! Inverse of generation: removes what the manifest says was generated.
//!
//! The walk follows the manifest only and never scans the filesystem, so files
//! the manifest does not name are left alone. Manual units, and anything derived
//! from them, are never touched. Every deletion is best-effort.
use crate::error::CleanupWarning;
use crate::fsutil::with_extension;
use crate::manifest::{Config, Group, LiteralDocument, Manifest, Node, Target, Testcase};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What a clean pass removed and what it could not.
#[derive(Debug, Default)]
pub struct CleanReport {
    pub files_removed: usize,
    pub dirs_removed: usize,
    pub warnings: Vec<CleanupWarning>,
}

/// Walks a manifest and deletes generated artifacts below `data_dir`.
pub struct Cleaner {
    data_dir: PathBuf,
    report: CleanReport,
}

impl Cleaner {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            report: CleanReport::default(),
        }
    }

    /// Remove every generated file the manifest names. Never fails.
    pub fn clean(mut self, manifest: &Manifest) -> CleanReport {
        self.clean_group(manifest.root());
        self.report
    }

    fn clean_group(&mut self, group: &Group) {
        for child in &group.children {
            match child {
                Node::Group(inner) => self.clean_group(inner),
                Node::Testcase(testcase) => self.clean_testcase(testcase, &group.config),
                Node::LiteralDocument(document) => self.clean_document(document),
            }
        }
    }

    fn clean_testcase(&mut self, testcase: &Testcase, config: &Config) {
        if testcase.is_manual() {
            return;
        }
        let path = self.data_dir.join(&testcase.path);
        match testcase.target {
            Target::Directory => self.remove_dir(&path),
            Target::File => {
                self.remove_file(&path);
                for ext in config.extension_names() {
                    self.remove_file(&with_extension(&path, ext));
                }
            }
        }
    }

    fn clean_document(&mut self, document: &LiteralDocument) {
        if document.payload.is_some() {
            let path = self.data_dir.join(&document.path);
            self.remove_file(&path);
        }
    }

    fn remove_file(&mut self, path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => {
                self.report.files_removed += 1;
                tracing::debug!(path = %path.display(), "removed file");
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => self.warn(path, err),
        }
    }

    fn remove_dir(&mut self, path: &Path) {
        match fs::remove_dir_all(path) {
            Ok(()) => {
                self.report.dirs_removed += 1;
                tracing::debug!(path = %path.display(), "removed directory");
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => self.warn(path, err),
        }
    }

    fn warn(&mut self, path: &Path, err: io::Error) {
        let warning = CleanupWarning {
            path: path.to_path_buf(),
            message: err.to_string(),
        };
        tracing::warn!("{warning}");
        self.report.warnings.push(warning);
    }
}

/// Clean `data_dir` according to `manifest`.
pub fn clean(manifest: &Manifest, data_dir: &Path) -> CleanReport {
    Cleaner::new(data_dir).clean(manifest)
}
