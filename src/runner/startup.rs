//! Per-sandbox startup file for the console build.
//!
//! GMAT resolves several startup paths against its own working directory. Each
//! sandbox gets a private copy of the default startup file with those paths
//! made absolute so concurrent or successive runs never share output locations.
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

pub const STARTUP_FILE_NAME: &str = "gmat_startup_file.txt";

const ROOT_PATH_KEY: &str = "ROOT_PATH";
const OUTPUT_PATH_KEY: &str = "OUTPUT_PATH";
const LOG_FILE_KEY: &str = "LOG_FILE";
const PLUGIN_PREFIX: &str = "PLUGIN";
const PLUGIN_RELATIVE_MARKER: &str = "../plugins/";
const PARENT_MARKER: &str = "../";
const LOG_FILE_VALUE: &str = "OUTPUT_PATH/GmatLog.txt";
const KEY_WIDTH: usize = 25;

enum Directive<'a> {
    RootPath,
    OutputPath,
    LogFile,
    Plugin { lhs: &'a str, value: &'a str },
    Other,
}

fn classify(line: &str) -> Directive<'_> {
    if is_assignment(line, ROOT_PATH_KEY) {
        return Directive::RootPath;
    }
    if is_assignment(line, OUTPUT_PATH_KEY) {
        return Directive::OutputPath;
    }
    if is_assignment(line, LOG_FILE_KEY) {
        return Directive::LogFile;
    }
    if line.trim().starts_with(PLUGIN_PREFIX) {
        if let Some((lhs, rhs)) = line.split_once('=') {
            return Directive::Plugin {
                lhs,
                value: rhs.trim(),
            };
        }
    }
    Directive::Other
}

/// `KEY` at column zero, optional whitespace, then `=`.
fn is_assignment(line: &str, key: &str) -> bool {
    line.strip_prefix(key)
        .is_some_and(|rest| rest.trim_start().starts_with('='))
}

fn directive_line(key: &str, value: &str) -> String {
    format!("{key:<width$}= {value}", width = KEY_WIDTH)
}

/// Rewrite the four path directive families; every other line passes through.
///
/// `root_path` and `output_path` must already be absolute.
pub fn rewrite_startup_text(text: &str, root_path: &Path, output_path: &Path) -> String {
    let mut out = String::with_capacity(text.len() + 256);
    for line in text.lines() {
        let rewritten = match classify(line) {
            Directive::RootPath => {
                directive_line(ROOT_PATH_KEY, &root_path.display().to_string())
            }
            Directive::OutputPath => directive_line(
                OUTPUT_PATH_KEY,
                &format!("{}{MAIN_SEPARATOR}", output_path.display()),
            ),
            Directive::LogFile => directive_line(LOG_FILE_KEY, LOG_FILE_VALUE),
            Directive::Plugin { lhs, value } if value.starts_with(PLUGIN_RELATIVE_MARKER) => {
                let relative = value.strip_prefix(PARENT_MARKER).unwrap_or(value);
                format!("{lhs}= {}", root_path.join(relative).display())
            }
            Directive::Plugin { .. } | Directive::Other => line.to_string(),
        };
        out.push_str(&rewritten);
        out.push('\n');
    }
    out
}

/// Write a sandbox-private startup file next to `work_dir` contents.
///
/// Reads `gmat_startup_file.txt` from the binary's directory and returns the
/// path of the rewritten copy inside `work_dir`.
pub fn build_contained_startup_file(gmat_bin: &Path, work_dir: &Path) -> Result<PathBuf> {
    let bin_dir = parent_or_cwd(gmat_bin);
    let default_startup = bin_dir.join(STARTUP_FILE_NAME);
    if !default_startup.is_file() {
        return Err(anyhow!(
            "GMAT startup file not found: {}",
            default_startup.display()
        ));
    }
    let text = fs::read_to_string(&default_startup)
        .with_context(|| format!("read {}", default_startup.display()))?;

    let install_root = parent_or_cwd(&bin_dir);
    let root_path = install_root
        .canonicalize()
        .with_context(|| format!("resolve GMAT root {}", install_root.display()))?;
    let output_path = work_dir
        .canonicalize()
        .with_context(|| format!("resolve sandbox {}", work_dir.display()))?;

    let rewritten = rewrite_startup_text(&text, &root_path, &output_path);
    let target = work_dir.join(STARTUP_FILE_NAME);
    fs::write(&target, rewritten.as_bytes())
        .with_context(|| format!("write {}", target.display()))?;
    tracing::debug!(startup_file = %target.display(), "wrote contained startup file");
    Ok(target)
}

fn parent_or_cwd(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
