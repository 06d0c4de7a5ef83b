//! Typed paths into the lab layout.
//!
//! Centralizing path construction keeps the orchestrator, the listing command,
//! and the helper commands in agreement about where artifacts live.
use std::path::{Path, PathBuf};

/// Convenience wrapper for locating lab inputs and run artifacts.
#[derive(Debug, Clone)]
pub struct LabPaths {
    root: PathBuf,
}

impl LabPaths {
    /// Create a path helper rooted at the repository root.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Return the repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the `.gmat-lab/` directory path.
    pub fn lab_dir(&self) -> PathBuf {
        self.root.join(".gmat-lab")
    }

    /// Return the `.gmat-lab/cases/<tier>/catalog.json` path.
    pub fn catalog_path(&self, tier: &str) -> PathBuf {
        self.lab_dir().join("cases").join(tier).join("catalog.json")
    }

    /// Return the `.gmat-lab/tmp/` sandbox parent.
    pub fn tmp_dir(&self) -> PathBuf {
        self.lab_dir().join("tmp")
    }

    /// Return the `.gmat-lab/outputs/` directory path.
    pub fn outputs_dir(&self) -> PathBuf {
        self.lab_dir().join("outputs")
    }

    /// Return the latest-output directory for one case.
    pub fn case_output_dir(&self, case_id: &str) -> PathBuf {
        self.outputs_dir().join(case_id)
    }

    /// Return the `.gmat-lab/cache/` directory path.
    pub fn cache_dir(&self) -> PathBuf {
        self.lab_dir().join("cache")
    }

    /// Return the run history root, `docs/test-runs/`.
    pub fn runs_root(&self) -> PathBuf {
        self.root.join("docs").join("test-runs")
    }

    /// Return the `docs/test-runs/index.json` path.
    pub fn run_index_path(&self) -> PathBuf {
        self.runs_root().join("index.json")
    }

    /// Return the `docs/test-runs/LATEST` pointer path.
    pub fn latest_path(&self) -> PathBuf {
        self.runs_root().join("LATEST")
    }

    /// Return the directory for one run.
    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.runs_root().join(run_id)
    }

    /// Return the per-case artifact directory inside a run.
    pub fn run_case_dir(&self, run_dir: &Path, case_id: &str) -> PathBuf {
        run_dir.join("cases").join(case_id)
    }

    /// Resolve a catalog-relative reference against the repository root.
    pub fn resolve(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }
}
