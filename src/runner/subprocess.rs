use super::command::{build_command, InvocationShape};
use super::env::build_environment;
use super::startup::build_contained_startup_file;
use super::GmatRunner;
use crate::config::HarnessConfig;
use crate::model::{ExecutionRequest, ExecutionResult};
use crate::staging::{create_contained_workdir, SANDBOX_PREFIX};
use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Instant;

/// Runs the simulator as a blocking child process with captured output.
#[derive(Debug, Clone)]
pub struct SubprocessRunner {
    gmat_bin: PathBuf,
    compat_lib_dir: Option<PathBuf>,
}

impl SubprocessRunner {
    pub fn new(gmat_bin: PathBuf, compat_lib_dir: Option<PathBuf>) -> Self {
        Self {
            gmat_bin,
            compat_lib_dir,
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.gmat_bin.clone(), config.compat_lib_dir.clone())
    }

    fn command_line(&self, request: &ExecutionRequest) -> Result<Vec<std::ffi::OsString>> {
        let shape = InvocationShape::for_binary(&self.gmat_bin);
        let startup_file = if shape.needs_startup_file() {
            Some(build_contained_startup_file(
                &self.gmat_bin,
                &request.work_dir,
            )?)
        } else {
            None
        };
        Ok(build_command(
            shape,
            &self.gmat_bin,
            &request.script_path,
            &request.work_dir,
            startup_file.as_deref(),
        ))
    }
}

impl GmatRunner for SubprocessRunner {
    fn run(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        if !self.gmat_bin.exists() {
            return Err(anyhow!("GMAT binary not found: {}", self.gmat_bin.display()));
        }
        if !request.script_path.exists() {
            return Err(anyhow!(
                "GMAT script not found: {}",
                request.script_path.display()
            ));
        }

        let envs = build_environment(
            env::vars_os(),
            self.compat_lib_dir.as_deref(),
            request.env_overrides.as_ref(),
        );
        let argv = self.command_line(request)?;
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow!("empty GMAT command line"))?;
        tracing::debug!(
            command = %display_argv(&argv),
            cwd = %request.work_dir.display(),
            "spawning GMAT"
        );

        let started = Instant::now();
        let output = Command::new(program)
            .args(args)
            .current_dir(&request.work_dir)
            .env_clear()
            .envs(&envs)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("spawn {}", self.gmat_bin.display()))?;
        let returncode = exit_code(&output.status);
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            returncode,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "GMAT run complete"
        );

        Ok(ExecutionResult {
            returncode,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn create_contained_workdir(&self, base: Option<&Path>) -> Result<PathBuf> {
        create_contained_workdir(base, SANDBOX_PREFIX)
    }
}

/// Exit code, or `-signal` for a signal-terminated child on unix.
pub fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

pub(crate) fn display_argv(argv: &[std::ffi::OsString]) -> String {
    let parts: Vec<String> = argv
        .iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    shell_words::join(parts)
}
