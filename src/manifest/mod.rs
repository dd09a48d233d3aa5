//! Manifest model and loader.
//!
//! The raw YAML manifest is classified once into a closed tree of groups,
//! testcases and literal documents, each carrying its canonical slash-path and
//! the resolved config of its scope. Nothing downstream re-inspects YAML shapes.
mod config;
mod generator;
mod load;

use crate::command::CommandChain;
use anyhow::{Context, Result};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

pub use config::{
    parse_scope_config, Config, ExtensionRule, ExtensionSetting, ScopeOverrides,
    ANSWER_EXTENSION, CONFIG_KEY, GENERATED_MARKER,
};
pub use load::{load, TESTDATA_KEY};

/// A fully classified manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    root: Group,
}

impl Manifest {
    /// The top-level group, mapped onto the data directory itself.
    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Every node path in manifest order, depth first.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        collect_paths(&self.root, &mut paths);
        paths
    }
}

fn collect_paths<'a>(group: &'a Group, paths: &mut Vec<&'a str>) {
    for child in &group.children {
        paths.push(child.path());
        if let Node::Group(inner) = child {
            collect_paths(inner, paths);
        }
    }
}

/// A directory in the data tree.
#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,
    /// Slash-path relative to the data directory; empty for the root.
    pub path: String,
    /// Children were declared as a sequence and carry index prefixes.
    pub ordered: bool,
    /// Resolved config in effect inside this group.
    pub config: Config,
    pub children: Vec<Node>,
}

impl Group {
    /// Names declared directly in this group; used to skip them when scanning.
    pub fn declared_names(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(Node::name)
    }
}

/// What a unit's generator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A single `.in` file.
    File,
    /// A whole directory of testcases (a group generator).
    Directory,
}

/// A generated or manual unit: one `.in` file or one generated directory.
#[derive(Debug, Clone)]
pub struct Testcase {
    pub name: String,
    pub path: String,
    pub target: Target,
    /// `None` marks a manual unit whose files are authored by hand.
    pub generator: Option<CommandChain>,
}

impl Testcase {
    pub fn is_manual(&self) -> bool {
        self.generator.is_none()
    }

    /// Relative path without the `.in` suffix, e.g. `sample/1`.
    pub fn base_path(&self) -> &str {
        match self.target {
            Target::File => self.path.strip_suffix(".in").unwrap_or(&self.path),
            Target::Directory => &self.path,
        }
    }
}

/// A YAML document written verbatim next to the group's testcases.
#[derive(Debug, Clone)]
pub struct LiteralDocument {
    pub name: String,
    pub path: String,
    /// `None` when the manifest value is `null`: the file is maintained by hand.
    pub payload: Option<Mapping>,
}

impl LiteralDocument {
    /// Serialize the payload the way it is written to disk.
    pub fn render(&self) -> Result<Option<String>> {
        self.payload
            .as_ref()
            .map(|payload| {
                serde_yaml::to_string(payload)
                    .with_context(|| format!("serialize /{}", self.path))
            })
            .transpose()
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Group(Group),
    Testcase(Testcase),
    LiteralDocument(LiteralDocument),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Group(group) => &group.name,
            Node::Testcase(testcase) => &testcase.name,
            Node::LiteralDocument(document) => &document.name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Node::Group(group) => &group.path,
            Node::Testcase(testcase) => &testcase.path,
            Node::LiteralDocument(document) => &document.path,
        }
    }
}

/// Read, parse and load the manifest file at `path`.
pub fn load_file(path: &Path) -> Result<Manifest> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let raw: Value = serde_yaml::from_str(&text)
        .with_context(|| format!("invalid YAML in {}", path.display()))?;
    load(&raw).with_context(|| format!("load {}", path.display()))
}
