use super::config::{join_at, parse_scope_config, Config, CONFIG_KEY};
use super::generator::parse_generator;
use super::{Group, LiteralDocument, Manifest, Node, Target, Testcase};
use crate::error::GenError;
use anyhow::Result;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Reserved key for a literal document written into the group's directory.
pub const TESTDATA_KEY: &str = "testdata.yaml";

/// Classify a parsed manifest into a tree and check global path uniqueness.
///
/// Fails before anything touches the filesystem.
pub fn load(raw: &Value) -> Result<Manifest> {
    let Value::Mapping(map) = raw else {
        return Err(GenError::schema(
            "",
            format!("expected top-level mapping, got {}", kind_of(raw)),
        )
        .into());
    };
    let entries = mapping_entries(map, "")?;
    let root = build_group(String::new(), String::new(), entries, false, &Config::default())?;
    let manifest = Manifest { root };
    check_unique_paths(&manifest)?;
    Ok(manifest)
}

fn build_group(
    name: String,
    path: String,
    entries: Vec<(String, &Value)>,
    ordered: bool,
    parent_config: &Config,
) -> Result<Group> {
    let mut config_value = None;
    for (key, value) in &entries {
        if key == CONFIG_KEY {
            if config_value.is_some() {
                return Err(GenError::schema(&path, "duplicate config").into());
            }
            config_value = Some(*value);
        }
    }
    let config = match config_value {
        Some(value) => parent_config.merge(&parse_scope_config(value, &path)?),
        None => parent_config.clone(),
    };

    let labelled = entries
        .iter()
        .filter(|(key, _)| key != CONFIG_KEY && key != TESTDATA_KEY)
        .count();
    let width = labelled.to_string().len();
    let mut index = 0;

    let mut children = Vec::new();
    for (key, value) in entries {
        if key == CONFIG_KEY {
            continue;
        }
        if !name_regex().is_match(&key) {
            return Err(GenError::schema(&path, format!("invalid key {key:?}")).into());
        }

        if key == TESTDATA_KEY {
            let payload = match value {
                Value::Null => None,
                Value::Mapping(map) => Some(map.clone()),
                other => {
                    return Err(GenError::schema(
                        &path,
                        format!("expected a mapping in {TESTDATA_KEY}, got {}", kind_of(other)),
                    )
                    .into())
                }
            };
            children.push(Node::LiteralDocument(LiteralDocument {
                path: join_at(&path, &key),
                name: key,
                payload,
            }));
            continue;
        }

        let child_name = if ordered {
            index += 1;
            format!("{index:0width$}-{key}")
        } else {
            key.clone()
        };
        let child_path = join_at(&path, &child_name);

        let node = match classify(&key, value, &child_path)? {
            Shape::Unordered(map) => {
                if ordered {
                    return Err(GenError::schema(
                        &child_path,
                        "found unordered data in an ordered group",
                    )
                    .into());
                }
                let entries = mapping_entries(map, &child_path)?;
                Node::Group(build_group(child_name, child_path, entries, false, &config)?)
            }
            Shape::Ordered(items) => {
                let entries = sequence_entries(items, &child_path)?;
                Node::Group(build_group(child_name, child_path, entries, true, &config)?)
            }
            Shape::Unit => {
                let generator = parse_generator(value, &child_path)?;
                let target = if key.ends_with(".in") {
                    Target::File
                } else {
                    Target::Directory
                };
                Node::Testcase(Testcase {
                    name: child_name,
                    path: child_path,
                    target,
                    generator,
                })
            }
        };
        children.push(node);
    }

    Ok(Group {
        name,
        path,
        ordered,
        config,
        children,
    })
}

enum Shape<'a> {
    Unordered(&'a Mapping),
    Ordered(&'a [Value]),
    Unit,
}

fn classify<'a>(key: &str, value: &'a Value, at: &str) -> Result<Shape<'a>> {
    match value {
        Value::Mapping(map) => Ok(Shape::Unordered(map)),
        Value::Sequence(items) if !key.ends_with(".in") => {
            let mappings = items.iter().filter(|item| item.is_mapping()).count();
            if mappings == 0 {
                Ok(Shape::Unit)
            } else if mappings == items.len() {
                Ok(Shape::Ordered(items))
            } else {
                Err(GenError::schema(at, "sequence mixes ordered group items and commands").into())
            }
        }
        _ => Ok(Shape::Unit),
    }
}

fn mapping_entries<'a>(map: &'a Mapping, at: &str) -> Result<Vec<(String, &'a Value)>> {
    map.iter()
        .map(|(key, value)| Ok((key_string(key, at)?, value)))
        .collect()
}

fn sequence_entries<'a>(items: &'a [Value], at: &str) -> Result<Vec<(String, &'a Value)>> {
    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let map = match item {
            Value::Mapping(map) if map.len() == 1 => map,
            _ => {
                return Err(
                    GenError::schema(at, "each ordered item must be a single-entry mapping").into(),
                )
            }
        };
        entries.extend(mapping_entries(map, at)?);
    }
    Ok(entries)
}

fn key_string(key: &Value, at: &str) -> Result<String> {
    match key {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(GenError::schema(at, format!("invalid key {other:?}")).into()),
    }
}

fn check_unique_paths(manifest: &Manifest) -> Result<()> {
    let mut seen = HashSet::new();
    for path in manifest.paths() {
        if !seen.insert(path) {
            return Err(GenError::DuplicatePath {
                path: format!("/{path}"),
            }
            .into());
        }
    }
    Ok(())
}

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*[A-Za-z0-9]$").expect("regex for element names")
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
