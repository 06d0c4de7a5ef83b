//! Run history persistence: the run index, the LATEST pointer, and manifests.
//!
//! The index is read, updated, and rewritten wholesale once per invocation.
//! Nothing guards it against concurrent orchestrators; a second writer racing
//! on `next_run` would produce duplicate run numbers.
use crate::git::SourceState;
use crate::paths::LabPaths;
use crate::staging::{write_json, write_text};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunIndex {
    #[serde(default = "first_run_number")]
    pub next_run: u32,
    #[serde(default)]
    pub runs: Vec<RunSummary>,
}

fn first_run_number() -> u32 {
    1
}

impl Default for RunIndex {
    fn default() -> Self {
        Self {
            next_run: first_run_number(),
            runs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub run_number: u32,
    pub timestamp_utc: String,
    pub tier: String,
    pub case_filter: Option<String>,
    pub git_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub case: String,
    pub returncode: i32,
    /// Per-case artifact directory inside the run; `None` when the case never ran.
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub run_number: u32,
    pub timestamp_utc: String,
    pub tier: String,
    pub case_filter: Option<String>,
    pub git: SourceState,
    pub cases: Vec<CaseRecord>,
    #[serde(default)]
    pub failures: usize,
}

/// One orchestrator invocation's run directory and in-memory manifest.
#[derive(Debug)]
pub struct RunSnapshot {
    pub run_dir: PathBuf,
    pub manifest: RunManifest,
}

impl RunSnapshot {
    pub fn run_id(&self) -> &str {
        &self.manifest.run_id
    }

    pub fn record(&mut self, case: &str, returncode: i32, path: Option<&Path>) {
        self.manifest.cases.push(CaseRecord {
            case: case.to_string(),
            returncode,
            path: path.map(|path| path.display().to_string()),
        });
    }

    /// Stamp the failure count and persist `manifest.json`.
    pub fn finalize(&mut self, failures: usize) -> Result<PathBuf> {
        self.manifest.failures = failures;
        let path = self.run_dir.join("manifest.json");
        write_json(&path, &self.manifest)?;
        Ok(path)
    }
}

pub fn format_run_id(run_number: u32, label: &str) -> String {
    format!("run-{run_number:04}-{label}")
}

pub fn load_run_index(path: &Path) -> Result<RunIndex> {
    if !path.exists() {
        return Ok(RunIndex::default());
    }
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse run index {}", path.display()))
}

/// Allocate the next run number, create its directory, and record it in the index.
pub fn create_run_snapshot(
    paths: &LabPaths,
    tier: &str,
    case_filter: Option<&str>,
    git: SourceState,
    now: DateTime<Utc>,
) -> Result<RunSnapshot> {
    let runs_root = paths.runs_root();
    fs::create_dir_all(&runs_root).with_context(|| format!("create {}", runs_root.display()))?;
    let index_path = paths.run_index_path();
    let mut index = load_run_index(&index_path)?;

    let run_number = index.next_run;
    let run_id = format_run_id(run_number, &git.label);
    let run_dir = paths.run_dir(&run_id);
    fs::create_dir_all(&run_dir).with_context(|| format!("create {}", run_dir.display()))?;

    let timestamp_utc = now.to_rfc3339_opts(SecondsFormat::Micros, false);
    let manifest = RunManifest {
        run_id: run_id.clone(),
        run_number,
        timestamp_utc: timestamp_utc.clone(),
        tier: tier.to_string(),
        case_filter: case_filter.map(str::to_string),
        git: git.clone(),
        cases: Vec::new(),
        failures: 0,
    };

    index.next_run = run_number + 1;
    index.runs.push(RunSummary {
        run_id: run_id.clone(),
        run_number,
        timestamp_utc,
        tier: tier.to_string(),
        case_filter: case_filter.map(str::to_string),
        git_label: git.label,
    });
    write_json(&index_path, &index)?;
    write_text(&paths.latest_path(), &format!("{run_id}\n"))?;
    tracing::info!(run_id = %run_id, "created run snapshot");

    Ok(RunSnapshot { run_dir, manifest })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn run_numbers_increase_across_invocations() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = LabPaths::new(temp.path().to_path_buf());

        let first = create_run_snapshot(&paths, "tier1", None, SourceState::no_repo(), fixed_now())
            .expect("first snapshot");
        let second = create_run_snapshot(
            &paths,
            "tier2",
            Some("leo"),
            SourceState::no_repo(),
            fixed_now(),
        )
        .expect("second snapshot");

        assert_eq!(first.run_id(), "run-0001-norepo");
        assert_eq!(second.run_id(), "run-0002-norepo");
        assert!(second.run_dir.is_dir());

        let index = load_run_index(&paths.run_index_path()).expect("index");
        assert_eq!(index.next_run, 3);
        let numbers: Vec<u32> = index.runs.iter().map(|run| run.run_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(index.runs[1].case_filter.as_deref(), Some("leo"));
        assert_eq!(index.runs[1].git_label, "norepo");
        assert_eq!(
            fs::read_to_string(paths.latest_path()).expect("latest"),
            "run-0002-norepo\n"
        );
    }

    #[test]
    fn existing_index_counter_is_respected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = LabPaths::new(temp.path().to_path_buf());
        write_text(&paths.run_index_path(), r#"{"next_run": 42, "runs": []}"#).expect("seed");

        let snapshot = create_run_snapshot(&paths, "tier1", None, SourceState::no_repo(), fixed_now())
            .expect("snapshot");

        assert_eq!(snapshot.manifest.run_number, 42);
        assert_eq!(snapshot.run_id(), "run-0042-norepo");
        assert_eq!(snapshot.manifest.timestamp_utc, "2026-03-14T09:26:53.000000+00:00");
    }

    #[test]
    fn finalize_writes_manifest_with_failures() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = LabPaths::new(temp.path().to_path_buf());
        let mut snapshot =
            create_run_snapshot(&paths, "tier1", None, SourceState::no_repo(), fixed_now())
                .expect("snapshot");
        snapshot.record("ok", 0, Some(Path::new("/runs/cases/ok")));
        snapshot.record("odd", 2, None);

        let path = snapshot.finalize(1).expect("finalize");

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).expect("read")).expect("parse");
        assert_eq!(value["failures"], 1);
        assert_eq!(value["cases"][0]["case"], "ok");
        assert_eq!(value["cases"][0]["path"], "/runs/cases/ok");
        assert_eq!(value["cases"][1]["returncode"], 2);
        assert!(value["cases"][1]["path"].is_null());
        assert_eq!(value["git"]["label"], "norepo");
    }
}
