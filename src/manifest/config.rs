//! Per-scope extension configuration and its inheritance.
//!
//! A scope's `config` mapping is parsed into overrides, then merged over the
//! parent's resolved config to produce an immutable snapshot for that scope.
use super::generator::parse_generator;
use crate::command::CommandChain;
use crate::error::GenError;
use anyhow::Result;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Reserved key holding a scope's configuration.
pub const CONFIG_KEY: &str = "config";
/// Extension whose generator, if any, always runs first in a scope.
pub const ANSWER_EXTENSION: &str = "ans";
/// Value marking an extension as produced upstream by a group generator.
pub const GENERATED_MARKER: &str = "generated";

const EXTENSIONS_KEY: &str = "extensions";

/// How a configured extension is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionRule {
    /// Produced by a group generator alongside the `.in`; only preserved.
    External,
    /// Derived from the `.in` by running a command chain.
    Command(CommandChain),
}

/// One scope's override for one extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionSetting {
    /// Remove any inherited rule.
    Disabled,
    Rule(ExtensionRule),
}

/// The raw `config` of a single scope, validated but not yet merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeOverrides {
    pub extensions: BTreeMap<String, ExtensionSetting>,
    /// Unknown keys, carried through for forward compatibility.
    pub extra: BTreeMap<String, Value>,
}

/// Resolved configuration in effect for a scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    extensions: BTreeMap<String, ExtensionRule>,
    extra: BTreeMap<String, Value>,
}

impl Config {
    /// Produce the child scope's config; `self` is left untouched.
    pub fn merge(&self, overrides: &ScopeOverrides) -> Config {
        let mut merged = self.clone();
        for (ext, setting) in &overrides.extensions {
            match setting {
                ExtensionSetting::Disabled => {
                    merged.extensions.remove(ext);
                }
                ExtensionSetting::Rule(rule) => {
                    merged.extensions.insert(ext.clone(), rule.clone());
                }
            }
        }
        for (key, value) in &overrides.extra {
            merged.extra.insert(key.clone(), value.clone());
        }
        merged
    }

    pub fn extension(&self, ext: &str) -> Option<&ExtensionRule> {
        self.extensions.get(ext)
    }

    /// Every configured extension name.
    pub fn extension_names(&self) -> impl Iterator<Item = &str> {
        self.extensions.keys().map(String::as_str)
    }

    pub fn is_external(&self, ext: &str) -> bool {
        matches!(self.extensions.get(ext), Some(ExtensionRule::External))
    }

    /// Extensions produced upstream, in name order.
    pub fn externally_generated(&self) -> Vec<&str> {
        self.extensions
            .iter()
            .filter(|(_, rule)| matches!(rule, ExtensionRule::External))
            .map(|(ext, _)| ext.as_str())
            .collect()
    }

    /// Extensions to derive now, `ans` first and the rest in name order.
    pub fn newly_generated(&self) -> Vec<(&str, &CommandChain)> {
        let mut result: Vec<(&str, &CommandChain)> = self
            .extensions
            .iter()
            .filter_map(|(ext, rule)| match rule {
                ExtensionRule::Command(chain) => Some((ext.as_str(), chain)),
                ExtensionRule::External => None,
            })
            .collect();
        result.sort_by_key(|(ext, _)| *ext != ANSWER_EXTENSION);
        result
    }

    /// Unknown configuration keys passed through from the manifest.
    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }
}

/// Parse and validate the `config` value of the scope at `at`.
pub fn parse_scope_config(value: &Value, at: &str) -> Result<ScopeOverrides> {
    let Value::Mapping(map) = value else {
        return Err(GenError::schema(at, "config is not a mapping").into());
    };
    let mut overrides = ScopeOverrides::default();
    for (key, value) in map {
        let Some(key) = key.as_str() else {
            return Err(GenError::schema(at, format!("invalid config key {key:?}")).into());
        };
        if key == EXTENSIONS_KEY {
            overrides.extensions = parse_extensions(value, at)?;
        } else {
            tracing::warn!(key, at = %display_at(at), "unknown key in config");
            overrides.extra.insert(key.to_string(), value.clone());
        }
    }
    Ok(overrides)
}

fn parse_extensions(value: &Value, at: &str) -> Result<BTreeMap<String, ExtensionSetting>> {
    let map: &Mapping = match value {
        Value::Mapping(map) => map,
        Value::Null => return Ok(BTreeMap::new()),
        _ => return Err(GenError::schema(at, "config extensions is not a mapping").into()),
    };
    let mut extensions = BTreeMap::new();
    for (ext, gen) in map {
        let Some(ext) = ext.as_str() else {
            return Err(GenError::schema(at, format!("invalid extension {ext:?}")).into());
        };
        if ext == "in" {
            return Err(GenError::schema(at, "forbidden extension .in in extensions config").into());
        }
        if !extension_regex().is_match(ext) {
            return Err(GenError::schema(at, format!("invalid extension name {ext:?}")).into());
        }
        let setting = match gen {
            Value::Null | Value::Bool(false) => ExtensionSetting::Disabled,
            Value::String(text) if text == GENERATED_MARKER => {
                ExtensionSetting::Rule(ExtensionRule::External)
            }
            _ => {
                let ext_at = join_at(at, &format!("{CONFIG_KEY}/{EXTENSIONS_KEY}/{ext}"));
                match parse_generator(gen, &ext_at)? {
                    Some(chain) => ExtensionSetting::Rule(ExtensionRule::Command(chain)),
                    None => ExtensionSetting::Disabled,
                }
            }
        };
        extensions.insert(ext.to_string(), setting);
    }
    Ok(extensions)
}

fn extension_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("regex for extension names")
    })
}

pub(super) fn join_at(at: &str, name: &str) -> String {
    if at.is_empty() {
        name.to_string()
    } else {
        format!("{at}/{name}")
    }
}

fn display_at(at: &str) -> String {
    format!("/{at}")
}
