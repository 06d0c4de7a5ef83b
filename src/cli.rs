//! CLI argument parsing for the lab harness.
//!
//! The CLI stays thin: it resolves configuration once and hands explicit values
//! to the runner and orchestrator.
use crate::catalog::Tier;
use crate::baseline::DEFAULT_BASELINE_PATH;
use crate::fetch::DEFAULT_GROUP;
use crate::propagate::{DEFAULT_HOURS, DEFAULT_STEP_MIN};
use crate::screen::DEFAULT_THRESHOLD_KM;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "gmat-lab",
    version,
    about = "Contained GMAT scenario runs with a versioned run history",
    after_help = "Commands:\n  run [--tier tier1|tier2] [--case <id>]  Run catalog cases and snapshot artifacts\n  list                                    List catalog cases per tier\n  script <path>                           Run one script in a fresh sandbox\n  screen --input <csv>                    Flag close approaches in propagated states\n  fetch [--group <name>]                  Download a CelesTrak element set\n  propagate --input <tle>                 SGP4 states for up to 25 satellites\n  baseline [--run-dir <dir>]              Export reference case results as JSON\n\nEnvironment:\n  GMAT_BIN             Simulator binary (default GMAT/R2025a/bin/GmatConsole)\n  GMAT_COMPAT_LIB_DIR  Prepended to the library search path\n  GMAT_TEST_SANDBOX    Sandbox parent for `script` (default .gmat-sandbox)",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Repository root holding .gmat-lab/ and docs/test-runs/
    #[arg(long, value_name = "DIR", global = true)]
    pub root: Option<PathBuf>,

    /// Emit debug diagnostics on stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Run(RunArgs),
    List(ListArgs),
    Script(ScriptArgs),
    Screen(ScreenArgs),
    Fetch(FetchArgs),
    Propagate(PropagateArgs),
    Baseline(BaselineArgs),
}

/// Run command inputs for one orchestrator invocation.
#[derive(Parser, Debug)]
#[command(about = "Run catalog cases and record a run snapshot")]
pub struct RunArgs {
    /// Catalog tier to run
    #[arg(long, value_enum, default_value_t = Tier::Tier1)]
    pub tier: Tier,

    /// Run only the case with this id
    #[arg(long = "case", value_name = "ID")]
    pub case_id: Option<String>,

    /// Extra root-relative path ignored by the clean-tree check (repeatable)
    #[arg(long, value_name = "PATH")]
    pub exclude_dirty: Vec<String>,
}

#[derive(Parser, Debug)]
#[command(about = "List catalog cases for every tier")]
pub struct ListArgs {}

#[derive(Parser, Debug)]
#[command(about = "Run one GMAT script in a fresh contained workdir")]
pub struct ScriptArgs {
    /// Script to stage and run
    #[arg(value_name = "SCRIPT")]
    pub script: PathBuf,

    /// Environment override for the simulator process (repeatable)
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got {raw:?}")),
    }
}

#[derive(Parser, Debug)]
#[command(about = "Flag satellite pairs closer than a threshold")]
pub struct ScreenArgs {
    /// Propagation CSV (sat, minutes, x_km, y_km, z_km, ..., err)
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,

    /// Distance threshold in kilometres
    #[arg(long, value_name = "KM", default_value_t = DEFAULT_THRESHOLD_KM)]
    pub threshold_km: f64,

    /// Output CSV (default .gmat-lab/outputs/conjunction_flags.csv)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Download a CelesTrak element set into .gmat-lab/cache")]
pub struct FetchArgs {
    /// CelesTrak group name
    #[arg(long, default_value = DEFAULT_GROUP)]
    pub group: String,
}

#[derive(Parser, Debug)]
#[command(about = "Propagate two-line element sets with SGP4")]
pub struct PropagateArgs {
    /// TLE file (name line followed by lines 1 and 2)
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,

    /// Hours past each satellite's epoch
    #[arg(long, default_value_t = DEFAULT_HOURS)]
    pub hours: u32,

    /// Step between samples in minutes
    #[arg(
        long,
        value_name = "MIN",
        default_value_t = DEFAULT_STEP_MIN,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub step_min: u32,

    /// Output CSV (default .gmat-lab/outputs/sgp4_propagation.csv)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Export reference case results from a run snapshot")]
pub struct BaselineArgs {
    /// Run snapshot directory (default: the run named by docs/test-runs/LATEST)
    #[arg(long, value_name = "DIR")]
    pub run_dir: Option<PathBuf>,

    /// Output JSON
    #[arg(long, value_name = "PATH", default_value = DEFAULT_BASELINE_PATH)]
    pub out: PathBuf,
}
