//! Source-state labelling for run snapshots.
//!
//! Every run is tied to the revision it was produced from. Generated run
//! history is excluded from the cleanliness scan so recording a run does not
//! itself make the tree dirty.
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceState {
    /// `repo` or `no-repo`.
    pub state: String,
    pub commit: String,
    /// `clean`, `dirty`, or `unknown` outside a repository.
    pub dirty: String,
    pub label: String,
}

impl SourceState {
    pub fn no_repo() -> Self {
        Self {
            state: "no-repo".to_string(),
            commit: "none".to_string(),
            dirty: "unknown".to_string(),
            label: "norepo".to_string(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.dirty == "clean"
    }
}

fn capture(root: &Path, args: &[&str]) -> (bool, String) {
    match Command::new("git").args(args).current_dir(root).output() {
        Ok(output) => (
            output.status.success(),
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
        ),
        Err(err) => {
            tracing::debug!(error = %err, "git unavailable");
            (false, String::new())
        }
    }
}

/// Ask git for the revision and cleanliness of `root`.
///
/// `excludes` are root-relative paths ignored by the dirty check.
pub fn source_state(root: &Path, excludes: &[String]) -> SourceState {
    let (ok, inside) = capture(root, &["rev-parse", "--is-inside-work-tree"]);
    if !ok || inside != "true" {
        return SourceState::no_repo();
    }

    let (ok, commit) = capture(root, &["rev-parse", "--short", "HEAD"]);
    let commit = if ok && !commit.is_empty() {
        commit
    } else {
        "unborn".to_string()
    };

    let pathspecs: Vec<String> = excludes
        .iter()
        .map(|path| format!(":(exclude){path}"))
        .collect();
    let mut args = vec!["status", "--porcelain", "--", "."];
    args.extend(pathspecs.iter().map(String::as_str));
    let (ok, status) = capture(root, &args);
    let dirty = if ok && status.is_empty() {
        "clean"
    } else {
        "dirty"
    };

    SourceState {
        state: "repo".to_string(),
        label: format!("{commit}-{dirty}"),
        commit,
        dirty: dirty.to_string(),
    }
}

/// Refuse to run against uncommitted source or config changes.
pub fn ensure_clean(state: &SourceState) -> Result<()> {
    if state.is_clean() {
        return Ok(());
    }
    Err(anyhow!(
        "refusing to run tests with dirty source/config state. Commit or stash changes first."
    ))
}
