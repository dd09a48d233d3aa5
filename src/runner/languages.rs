//! Language table: how a program file is compiled and invoked.
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Built-in table used when a problem does not override an entry.
pub const DEFAULT_LANGUAGES_YAML: &str = include_str!("../defaults/languages.yaml");

/// How programs of one language are built and run.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Language {
    pub name: String,
    /// File extensions (without the dot) that select this language.
    pub extensions: Vec<String>,
    /// Compile command template; interpreted languages have none.
    #[serde(default)]
    pub compile: Option<String>,
    /// Run command template.
    pub run: String,
}

/// Languages keyed by identifier, e.g. `cpp` or `python3`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct LanguageTable {
    languages: BTreeMap<String, Language>,
}

impl LanguageTable {
    /// Parse a table from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let table: LanguageTable = serde_yaml::from_str(text).context("parse language table")?;
        for (key, language) in &table.languages {
            if language.run.trim().is_empty() {
                return Err(anyhow!("language {key} has an empty run command"));
            }
        }
        Ok(table)
    }

    /// Overlay `other` on top of `self`; entries with the same key are replaced.
    pub fn merged_with(mut self, other: LanguageTable) -> Self {
        self.languages.extend(other.languages);
        self
    }

    /// Find the language for a source file by its extension.
    pub fn for_source(&self, source: &Path) -> Option<&Language> {
        let ext = source.extension()?.to_str()?;
        self.languages
            .values()
            .find(|language| language.extensions.iter().any(|candidate| candidate == ext))
    }

    pub fn get(&self, key: &str) -> Option<&Language> {
        self.languages.get(key)
    }
}

/// Load the built-in table, overlaid with `override_path` when it exists.
pub fn load_language_table(override_path: &Path) -> Result<LanguageTable> {
    let defaults = LanguageTable::from_yaml(DEFAULT_LANGUAGES_YAML)?;
    if !override_path.is_file() {
        return Ok(defaults);
    }
    let text = fs::read_to_string(override_path)
        .with_context(|| format!("read {}", override_path.display()))?;
    let overrides = LanguageTable::from_yaml(&text)
        .with_context(|| format!("load {}", override_path.display()))?;
    tracing::debug!(path = %override_path.display(), "loaded language overrides");
    Ok(defaults.merged_with(overrides))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_common_generator_languages() {
        let table = LanguageTable::from_yaml(DEFAULT_LANGUAGES_YAML).expect("parse defaults");
        for (file, key) in [
            ("gen.c", "c"),
            ("gen.cpp", "cpp"),
            ("gen.cc", "cpp"),
            ("gen.rs", "rust"),
            ("gen.py", "python3"),
            ("gen.sh", "shell"),
        ] {
            let language = table.for_source(Path::new(file)).expect("language");
            assert_eq!(Some(language), table.get(key), "{file}");
        }
        assert!(table.for_source(Path::new("gen")).is_none());
    }

    #[test]
    fn overrides_replace_entries_by_key() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("languages.yaml");
        fs::write(
            &path,
            "python3:\n  name: PyPy\n  extensions: [py]\n  run: \"pypy3 {source}\"\n",
        )
        .expect("write overrides");

        let table = load_language_table(&path).expect("load table");
        let python = table.get("python3").expect("python entry");
        assert_eq!(python.run, "pypy3 {source}");
        assert!(table.get("cpp").is_some());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = LanguageTable::from_yaml("x:\n  name: X\n  extensions: []\n  run: x\n  flags: 1\n")
            .unwrap_err();
        assert!(format!("{err:#}").contains("flags"));
    }
}
