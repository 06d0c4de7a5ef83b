//! Per-case execution for the two catalog case types.
use super::CaseStatus;
use crate::catalog::Case;
use crate::config::HarnessConfig;
use crate::model::ExecutionRequest;
use crate::paths::LabPaths;
use crate::runner::{exit_code, GmatRunner, LOG_FILE_NAME};
use crate::staging::{
    copy_preserving, create_contained_workdir, prepare_script_in_workdir, reset_dir, stage_file,
    write_text,
};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Check preconditions, stage into a fresh sandbox, run, and collect outputs.
pub(super) fn run_gmat_case<R: GmatRunner>(
    paths: &LabPaths,
    config: &HarnessConfig,
    runner: &R,
    case: &Case,
) -> Result<CaseStatus> {
    if !config.gmat_bin.exists() {
        return Ok(CaseStatus::error(format!(
            "GMAT binary not found: {}",
            config.gmat_bin.display()
        )));
    }
    let Some(script_rel) = case.script.as_deref() else {
        return Ok(CaseStatus::error(format!("case {} has no script", case.id)));
    };
    let script = paths.resolve(script_rel);
    if !script.exists() {
        return Ok(CaseStatus::error(format!(
            "script missing: {}",
            script.display()
        )));
    }
    let mut data_files = Vec::with_capacity(case.data_files.len());
    for rel in &case.data_files {
        let source = paths.resolve(rel);
        if !source.exists() {
            return Ok(CaseStatus::error(format!(
                "data file missing: {}",
                source.display()
            )));
        }
        data_files.push(source);
    }

    let workdir = create_contained_workdir(Some(&paths.tmp_dir()), &format!("{}-", case.id))?;
    let staged = prepare_script_in_workdir(&script, &workdir)?;
    for source in &data_files {
        stage_file(source, &workdir)?;
    }
    tracing::debug!(case_id = %case.id, workdir = %workdir.display(), "staged case");

    let request = ExecutionRequest::new(staged, workdir.clone());
    let result = match runner.run(&request) {
        Ok(result) => result,
        Err(err) => return Ok(CaseStatus::error(format!("{err:#}"))),
    };

    let out_dir = paths.case_output_dir(&case.id);
    reset_dir(&out_dir)?;
    write_text(&out_dir.join("stdout.txt"), &result.stdout)?;
    write_text(&out_dir.join("stderr.txt"), &result.stderr)?;
    let log = workdir.join(LOG_FILE_NAME);
    if log.exists() {
        copy_preserving(&log, &out_dir.join(LOG_FILE_NAME))?;
    }
    if let Some(expected) = case.expected_report.as_deref() {
        let report = workdir.join(expected);
        if report.exists() {
            let target = out_dir.join(expected);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            copy_preserving(&report, &target)?;
        } else {
            println!("WARN: expected report not found: {expected}");
        }
    }

    Ok(CaseStatus::Completed {
        returncode: result.returncode,
        out_dir,
    })
}

/// Split the declared command on whitespace and run it from the repository root.
pub(super) fn run_command_case(paths: &LabPaths, case: &Case) -> Result<CaseStatus> {
    let words: Vec<&str> = case
        .command
        .as_deref()
        .map(|command| command.split_whitespace().collect())
        .unwrap_or_default();
    let Some((program, args)) = words.split_first() else {
        return Ok(CaseStatus::error(format!("case {} has no command", case.id)));
    };
    let program = match resolve_program(program, paths.root()) {
        Some(resolved) => resolved,
        None => return Ok(CaseStatus::error(format!("command not found: {program}"))),
    };
    tracing::debug!(case_id = %case.id, command = %shell_words::join(&words), "running command case");

    let output = Command::new(&program)
        .args(args)
        .current_dir(paths.root())
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("spawn {}", program.display()))?;

    let out_dir = paths.case_output_dir(&case.id);
    reset_dir(&out_dir)?;
    write_text(
        &out_dir.join("stdout.txt"),
        &String::from_utf8_lossy(&output.stdout),
    )?;
    write_text(
        &out_dir.join("stderr.txt"),
        &String::from_utf8_lossy(&output.stderr),
    )?;

    Ok(CaseStatus::Completed {
        returncode: exit_code(&output.status),
        out_dir,
    })
}

fn resolve_program(program: &str, root: &Path) -> Option<PathBuf> {
    which::which_in(program, std::env::var_os("PATH"), root).ok()
}
