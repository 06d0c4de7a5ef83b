//! Harness configuration resolved once at startup.
//!
//! Environment variables are read here and nowhere else; everything downstream
//! receives an explicit `HarnessConfig`.
use std::env;
use std::path::{Component, Path, PathBuf};

pub const ENV_GMAT_BIN: &str = "GMAT_BIN";
pub const ENV_COMPAT_LIB_DIR: &str = "GMAT_COMPAT_LIB_DIR";
pub const ENV_TEST_SANDBOX: &str = "GMAT_TEST_SANDBOX";

pub const DEFAULT_GMAT_BIN: &str = "GMAT/R2025a/bin/GmatConsole";
pub const DEFAULT_TEST_SANDBOX: &str = ".gmat-sandbox";

/// Generated run history is excluded from the dirty-tree scan by default.
pub const DEFAULT_DIRTY_EXCLUDES: &[&str] = &["docs/test-runs"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Simulator executable (absolute).
    pub gmat_bin: PathBuf,
    /// Prepended to the library search path of every simulator invocation.
    pub compat_lib_dir: Option<PathBuf>,
    /// Parent directory for ad-hoc contained workdirs.
    pub sandbox_root: PathBuf,
}

impl HarnessConfig {
    /// Resolve from the process environment, relative paths against `root`.
    pub fn from_env(root: &Path) -> Self {
        Self::from_lookup(root, |key| env::var(key).ok())
    }

    /// Resolve through an arbitrary lookup so callers can inject values.
    pub fn from_lookup<F>(root: &Path, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let gmat_bin = non_empty(ENV_GMAT_BIN).unwrap_or_else(|| DEFAULT_GMAT_BIN.to_string());
        let sandbox_root =
            non_empty(ENV_TEST_SANDBOX).unwrap_or_else(|| DEFAULT_TEST_SANDBOX.to_string());
        Self {
            gmat_bin: resolve(root, Path::new(&gmat_bin)),
            compat_lib_dir: non_empty(ENV_COMPAT_LIB_DIR)
                .map(|value| resolve(root, Path::new(&value))),
            sandbox_root: resolve(root, Path::new(&sandbox_root)),
        }
    }
}

/// `absolutize`, then follow symlinks when the target exists.
///
/// A symlinked binary must resolve to its install tree so the startup file
/// and ROOT_PATH come from the real `bin/` directory.
pub fn resolve(root: &Path, path: &Path) -> PathBuf {
    let absolute = absolutize(root, path);
    absolute.canonicalize().unwrap_or(absolute)
}

/// Join `path` onto `root` when relative and normalize `.`/`..` lexically.
///
/// Canonicalization would fail for paths that do not exist yet, and a missing
/// binary must still be reported by its intended location.
pub fn absolutize(root: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
