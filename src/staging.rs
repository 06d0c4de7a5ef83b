//! Workdir provisioning and artifact copying.
//!
//! Sandboxes are created fresh for every invocation and never cleaned up here;
//! disposal belongs to the caller.
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Prefix for ad-hoc runner sandboxes.
pub const SANDBOX_PREFIX: &str = "gmat-run-";

/// Create a fresh, uniquely named, empty directory under `base`.
///
/// `base` defaults to the platform temp root and is created if absent.
pub fn create_contained_workdir(base: Option<&Path>, prefix: &str) -> Result<PathBuf> {
    let root = match base {
        Some(base) => base.to_path_buf(),
        None => std::env::temp_dir(),
    };
    fs::create_dir_all(&root).with_context(|| format!("create {}", root.display()))?;
    let dir = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir_in(&root)
        .with_context(|| format!("create workdir in {}", root.display()))?;
    Ok(dir.keep())
}

/// Copy `source_script` into `work_dir` under its own filename.
pub fn prepare_script_in_workdir(source_script: &Path, work_dir: &Path) -> Result<PathBuf> {
    stage_file(source_script, work_dir)
}

/// Copy `source` into `dir`, keeping filename, permissions, and mtime.
pub fn stage_file(source: &Path, dir: &Path) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .ok_or_else(|| anyhow!("no file name in {}", source.display()))?;
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let target = dir.join(file_name);
    copy_preserving(source, &target)?;
    Ok(target)
}

/// Copy bytes, then the modification time, then the permission bits.
///
/// Permissions go last so a read-only source still yields a timestamped copy.
pub fn copy_preserving(source: &Path, dest: &Path) -> Result<()> {
    let metadata = fs::metadata(source).with_context(|| format!("stat {}", source.display()))?;
    let modified = metadata
        .modified()
        .with_context(|| format!("stat {}", source.display()))?;
    let mut reader =
        fs::File::open(source).with_context(|| format!("open {}", source.display()))?;
    let mut writer =
        fs::File::create(dest).with_context(|| format!("create {}", dest.display()))?;
    io::copy(&mut reader, &mut writer)
        .with_context(|| format!("copy {} to {}", source.display(), dest.display()))?;
    writer
        .set_modified(modified)
        .with_context(|| format!("set mtime on {}", dest.display()))?;
    drop(writer);
    fs::set_permissions(dest, metadata.permissions())
        .with_context(|| format!("set permissions on {}", dest.display()))?;
    Ok(())
}

/// Delete `dir` if present and recreate it empty.
pub fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("remove {}", dir.display()))?;
    }
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(())
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Pretty JSON with a trailing newline.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut text = serde_json::to_string_pretty(value).context("serialize JSON")?;
    text.push('\n');
    write_text(path, &text)
}

/// Mirror every file under `source` into `dest`, replacing `dest` wholesale.
pub fn replace_dir_with_copy(source: &Path, dest: &Path) -> Result<()> {
    if dest.exists() {
        fs::remove_dir_all(dest).with_context(|| format!("remove {}", dest.display()))?;
    }
    fs::create_dir_all(dest).with_context(|| format!("create {}", dest.display()))?;
    for file in collect_files_recursive(source)? {
        let rel = file
            .strip_prefix(source)
            .context("strip source prefix")?;
        let target = dest.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        copy_preserving(&file, &target)?;
    }
    Ok(())
}

pub fn collect_files_recursive(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !root.exists() {
        return Ok(files);
    }
    for entry in fs::read_dir(root).with_context(|| format!("read {}", root.display()))? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            files.extend(collect_files_recursive(&path)?);
        } else if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
