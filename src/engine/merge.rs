use crate::fsutil::sorted_entries;
use crate::manifest::Config;
use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Pick the files of a group generator's output tree that may enter the data
/// tree, as paths relative to `root`.
///
/// A regular file is adopted when its extension is `in`, or is configured as
/// externally generated and a sibling `.in` with the same basename exists in
/// the same output directory. Everything else is left behind.
pub(super) fn collect_adoptions(root: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    let mut adopted = Vec::new();
    collect_dir(root, Path::new(""), config, &mut adopted)?;
    Ok(adopted)
}

fn collect_dir(dir: &Path, rel: &Path, config: &Config, adopted: &mut Vec<PathBuf>) -> Result<()> {
    let entries = sorted_entries(dir)?;
    let files: HashSet<String> = entries
        .iter()
        .filter(|path| is_regular_file(path))
        .filter_map(|path| file_name(path))
        .collect();

    for path in &entries {
        let Some(name) = file_name(path) else {
            continue;
        };
        if path.is_dir() && !path.is_symlink() {
            collect_dir(path, &rel.join(&name), config, adopted)?;
            continue;
        }
        if !files.contains(&name) {
            continue;
        }
        let Some((base, ext)) = name.rsplit_once('.') else {
            continue;
        };
        if base.is_empty() || (ext != "in" && !config.is_external(ext)) {
            continue;
        }
        if !files.contains(&format!("{base}.in")) {
            tracing::debug!(file = %rel.join(&name).display(), "dropping extension without .in");
            continue;
        }
        adopted.push(rel.join(&name));
    }
    Ok(())
}

fn is_regular_file(path: &Path) -> bool {
    path.symlink_metadata()
        .map(|meta| meta.file_type().is_file())
        .unwrap_or(false)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}
