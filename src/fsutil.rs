use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Delete a file or directory tree if something exists at `path`.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    let Ok(meta) = fs::symlink_metadata(path) else {
        return Ok(());
    };
    if meta.is_dir() {
        fs::remove_dir_all(path).with_context(|| format!("remove {}", path.display()))?;
    } else {
        fs::remove_file(path).with_context(|| format!("remove {}", path.display()))?;
    }
    Ok(())
}

/// Make `path` a directory, creating missing ancestors and replacing any
/// non-directory found along the way.
///
/// With `recursive == false` only the last component may be created; the parent
/// is assumed to already be a directory.
pub fn ensure_directory(path: &Path, recursive: bool) -> Result<()> {
    let mut create = Vec::new();
    let mut current = path.to_path_buf();
    while !current.is_dir() {
        create.push(current.clone());
        if !recursive {
            break;
        }
        match current.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => current = parent.to_path_buf(),
            _ => break,
        }
    }
    for dir in create.iter().rev() {
        remove_if_exists(dir)?;
        fs::create_dir(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    Ok(())
}

/// Replace whatever is at `dest` with `source`: remove the old entry, then move
/// the new one into place.
///
/// Falls back to copy-then-rename when `source` lives on another filesystem.
pub fn replace_path(source: &Path, dest: &Path) -> Result<()> {
    remove_if_exists(dest)?;
    match fs::rename(source, dest) {
        Ok(()) => return Ok(()),
        Err(err) => tracing::debug!(
            source = %source.display(),
            error = %err,
            "rename failed, copying instead"
        ),
    }
    let file_name = dest
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("staged");
    let tmp_path = dest
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!(".{file_name}.tmp"));
    fs::copy(source, &tmp_path).with_context(|| format!("publish {}", dest.display()))?;
    fs::rename(&tmp_path, dest).with_context(|| format!("publish {}", dest.display()))?;
    fs::remove_file(source).with_context(|| format!("remove {}", source.display()))?;
    Ok(())
}

/// Restrict a generated file to `rw-r--r--`.
#[cfg(unix)]
pub fn set_output_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))
        .with_context(|| format!("set permissions on {}", path.display()))
}

#[cfg(not(unix))]
pub fn set_output_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// List the entries of a directory sorted by name, so walks are deterministic.
pub fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        entries.push(entry?.path());
    }
    entries.sort();
    Ok(entries)
}

/// Replace the trailing `.in` of a testcase path with `.{ext}`.
pub fn with_extension(in_path: &Path, ext: &str) -> PathBuf {
    in_path.with_extension(ext)
}
