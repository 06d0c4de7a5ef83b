//! Contained execution of the GMAT simulator.
//!
//! A runner turns an `ExecutionRequest` into an `ExecutionResult`. The
//! subprocess runner is the production implementation; tests substitute fakes
//! through the `GmatRunner` trait.
mod command;
mod env;
mod startup;
mod subprocess;

pub use command::LOG_FILE_NAME;
pub use subprocess::{exit_code, SubprocessRunner};

use crate::model::{ExecutionRequest, ExecutionResult};
use anyhow::Result;
use std::path::{Path, PathBuf};

pub trait GmatRunner {
    /// Run one request to completion. Nonzero exit codes are returned, not raised.
    fn run(&self, request: &ExecutionRequest) -> Result<ExecutionResult>;

    /// Create a fresh sandbox under `base` (platform temp root when `None`).
    fn create_contained_workdir(&self, base: Option<&Path>) -> Result<PathBuf>;
}
