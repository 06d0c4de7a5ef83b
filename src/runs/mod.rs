//! Catalog-driven test runs.
//!
//! Cases execute one at a time in catalog order. Each case's outputs are
//! refreshed under `.gmat-lab/outputs/<id>` and mirrored into the run snapshot
//! so history is never overwritten by later runs.
mod cases;
mod snapshot;

use snapshot::{create_run_snapshot, RunSnapshot};
#[cfg(test)]
use snapshot::load_run_index;

use crate::catalog::{Catalog, CaseKind, Tier};
use crate::config::HarnessConfig;
use crate::git::SourceState;
use crate::paths::LabPaths;
use crate::runner::GmatRunner;
use crate::staging::replace_dir_with_copy;
use anyhow::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};

use cases::{run_command_case, run_gmat_case};

/// Exit code for structural errors: dirty tree, missing inputs, no match.
pub const EXIT_STRUCTURAL: i32 = 2;

/// Outcome of one case before it is recorded.
#[derive(Debug)]
pub enum CaseStatus {
    /// The process ran; `returncode` is whatever it exited with.
    Completed { returncode: i32, out_dir: PathBuf },
    /// Nothing was executed, or execution could not be attempted.
    Error { message: String },
}

impl CaseStatus {
    pub(crate) fn error(message: String) -> Self {
        CaseStatus::Error { message }
    }
}

/// Selection for one orchestrator invocation.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub tier: Tier,
    pub case_filter: Option<String>,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub run_id: String,
    pub run_dir: PathBuf,
    pub matched: usize,
    pub failures: usize,
    pub errors: usize,
}

impl RunOutcome {
    /// 0 when every case passed, 1 on case failures, 2 on structural errors.
    pub fn exit_code(&self) -> i32 {
        if self.matched == 0 || self.errors > 0 {
            EXIT_STRUCTURAL
        } else if self.failures > 0 {
            1
        } else {
            0
        }
    }
}

pub struct Orchestrator<'a, R: GmatRunner> {
    paths: &'a LabPaths,
    config: &'a HarnessConfig,
    runner: &'a R,
}

impl<'a, R: GmatRunner> Orchestrator<'a, R> {
    pub fn new(paths: &'a LabPaths, config: &'a HarnessConfig, runner: &'a R) -> Self {
        Self {
            paths,
            config,
            runner,
        }
    }

    /// Snapshot, run every selected case, and persist the manifest.
    ///
    /// The caller is responsible for the clean-tree preflight.
    pub fn run(
        &self,
        request: &RunRequest,
        catalog: &Catalog,
        source: SourceState,
    ) -> Result<RunOutcome> {
        let mut snapshot = create_run_snapshot(
            self.paths,
            request.tier.as_str(),
            request.case_filter.as_deref(),
            source,
            Utc::now(),
        )?;
        println!("run_snapshot={}", snapshot.run_dir.display());

        let mut matched = 0;
        let mut failures = 0;
        let mut errors = 0;
        for case in catalog.select(request.case_filter.as_deref()) {
            matched += 1;
            tracing::info!(case_id = %case.id, kind = %case.kind, "running case");
            let status = match &case.kind {
                CaseKind::GmatScript => run_gmat_case(self.paths, self.config, self.runner, case),
                CaseKind::PythonCommand => run_command_case(self.paths, case),
                CaseKind::Unsupported(name) => {
                    Ok(CaseStatus::error(format!("unsupported case type {name}")))
                }
            }
            .unwrap_or_else(|err| CaseStatus::error(format!("{err:#}")));

            let status = self.archive_case(&snapshot.run_dir, &case.id, status);
            if matches!(status, CaseStatus::Error { .. }) {
                errors += 1;
            }
            let returncode = self.record_case(&mut snapshot, &case.id, status);
            if returncode != 0 {
                failures += 1;
            }
        }

        if matched == 0 {
            println!("No matching case found");
        }
        snapshot.finalize(failures)?;

        Ok(RunOutcome {
            run_id: snapshot.run_id().to_string(),
            run_dir: snapshot.run_dir.clone(),
            matched,
            failures,
            errors,
        })
    }

    /// Mirror a completed case's outputs into the run directory.
    ///
    /// A failed copy only fails this case.
    fn archive_case(&self, run_dir: &Path, case_id: &str, status: CaseStatus) -> CaseStatus {
        let CaseStatus::Completed { out_dir, .. } = &status else {
            return status;
        };
        let run_case_dir = self.paths.run_case_dir(run_dir, case_id);
        match replace_dir_with_copy(out_dir, &run_case_dir) {
            Ok(()) => status,
            Err(err) => CaseStatus::error(format!("archive case {case_id}: {err:#}")),
        }
    }

    /// Append the manifest entry and print the one-line summary.
    fn record_case(&self, snapshot: &mut RunSnapshot, case_id: &str, status: CaseStatus) -> i32 {
        match status {
            CaseStatus::Completed {
                returncode,
                out_dir,
            } => {
                let run_case_dir = self.paths.run_case_dir(&snapshot.run_dir, case_id);
                snapshot.record(case_id, returncode, Some(&run_case_dir));
                println!(
                    "case={case_id} returncode={returncode} out={}",
                    out_dir.display()
                );
                returncode
            }
            CaseStatus::Error { message } => {
                println!("ERROR: {message}");
                tracing::warn!(case_id, %message, "case not executed");
                snapshot.record(case_id, EXIT_STRUCTURAL, None);
                EXIT_STRUCTURAL
            }
        }
    }
}
