//! Value types exchanged between the orchestrator and a runner.
use std::collections::BTreeMap;
use std::path::PathBuf;

/// What to run: a staged script inside an exclusively owned workdir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub script_path: PathBuf,
    pub work_dir: PathBuf,
    /// Applied last, after the inherited environment and library path.
    pub env_overrides: Option<BTreeMap<String, String>>,
}

impl ExecutionRequest {
    pub fn new(script_path: PathBuf, work_dir: PathBuf) -> Self {
        Self {
            script_path,
            work_dir,
            env_overrides: None,
        }
    }

    pub fn with_env_overrides(mut self, overrides: BTreeMap<String, String>) -> Self {
        self.env_overrides = Some(overrides);
        self
    }
}

/// What happened. A nonzero `returncode` is an observation, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub returncode: i32,
    pub stdout: String,
    pub stderr: String,
}
