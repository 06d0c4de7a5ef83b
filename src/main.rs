mod baseline;
mod catalog;
mod cli;
mod config;
mod fetch;
mod git;
mod model;
mod paths;
mod propagate;
mod runner;
mod runs;
mod screen;
mod staging;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::catalog::{load_catalog, render_listing};
use crate::cli::{
    BaselineArgs, Command, FetchArgs, PropagateArgs, RootArgs, RunArgs, ScreenArgs, ScriptArgs,
};
use crate::config::{absolutize, HarnessConfig, DEFAULT_DIRTY_EXCLUDES};
use crate::model::ExecutionRequest;
use crate::paths::LabPaths;
use crate::runner::{GmatRunner, SubprocessRunner};
use crate::runs::{Orchestrator, RunRequest, EXIT_STRUCTURAL};

fn init_tracing(verbose: bool) {
    let default = if verbose { "gmat_lab=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    match dispatch(args) {
        Ok(code) => code,
        Err(err) => {
            println!("ERROR: {err:#}");
            exit_code(EXIT_STRUCTURAL)
        }
    }
}

fn dispatch(args: RootArgs) -> Result<ExitCode> {
    let root = resolve_root(args.root.as_deref())?;
    let paths = LabPaths::new(root);
    match args.command {
        Command::Run(run) => run_cases(&paths, run),
        Command::List(_) => {
            print!("{}", render_listing(&paths)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Script(script) => run_script(&paths, script),
        Command::Screen(screen) => run_screen(&paths, screen),
        Command::Fetch(fetch) => run_fetch(&paths, fetch),
        Command::Propagate(propagate) => run_propagate(&paths, propagate),
        Command::Baseline(baseline) => run_baseline(&paths, baseline),
    }
}

fn resolve_root(root: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("resolve current directory")?;
    Ok(match root {
        Some(root) => absolutize(&cwd, root),
        None => cwd,
    })
}

fn exit_code(code: i32) -> ExitCode {
    match u8::try_from(code) {
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::FAILURE,
    }
}

fn run_cases(paths: &LabPaths, args: RunArgs) -> Result<ExitCode> {
    let mut excludes: Vec<String> = DEFAULT_DIRTY_EXCLUDES
        .iter()
        .map(|path| path.to_string())
        .collect();
    excludes.extend(args.exclude_dirty);

    let source = git::source_state(paths.root(), &excludes);
    tracing::debug!(label = %source.label, "source state");
    git::ensure_clean(&source)?;

    let catalog = load_catalog(paths, args.tier)?;
    let config = HarnessConfig::from_env(paths.root());
    let runner = SubprocessRunner::from_config(&config);
    let orchestrator = Orchestrator::new(paths, &config, &runner);
    let request = RunRequest {
        tier: args.tier,
        case_filter: args.case_id,
    };
    let outcome = orchestrator.run(&request, &catalog, source)?;
    tracing::info!(
        run_id = %outcome.run_id,
        matched = outcome.matched,
        failures = outcome.failures,
        errors = outcome.errors,
        "run finished"
    );
    Ok(exit_code(outcome.exit_code()))
}

fn run_script(paths: &LabPaths, args: ScriptArgs) -> Result<ExitCode> {
    let config = HarnessConfig::from_env(paths.root());
    let runner = SubprocessRunner::from_config(&config);
    let script = absolutize(paths.root(), &args.script);
    let work_dir = runner.create_contained_workdir(Some(&config.sandbox_root))?;
    let staged = staging::prepare_script_in_workdir(&script, &work_dir)?;

    let mut request = ExecutionRequest::new(staged, work_dir.clone());
    if !args.env.is_empty() {
        request = request.with_env_overrides(args.env.into_iter().collect());
    }
    let result = runner.run(&request)?;
    print!("{}", result.stdout);
    eprint!("{}", result.stderr);
    println!("workdir={}", work_dir.display());
    Ok(exit_code(result.returncode))
}

fn run_screen(paths: &LabPaths, args: ScreenArgs) -> Result<ExitCode> {
    let input = absolutize(paths.root(), &args.input);
    let output = match args.out {
        Some(out) => absolutize(paths.root(), &out),
        None => paths.outputs_dir().join("conjunction_flags.csv"),
    };
    let flags = screen::screen_file(&input, &output, args.threshold_km)?;
    tracing::debug!(flags, "conjunction flags written");
    println!("saved={}", output.display());
    Ok(ExitCode::SUCCESS)
}

fn run_fetch(paths: &LabPaths, args: FetchArgs) -> Result<ExitCode> {
    let (path, bytes) = fetch::fetch_group(&paths.cache_dir(), &args.group)?;
    println!("saved={} bytes={bytes}", path.display());
    Ok(ExitCode::SUCCESS)
}

fn run_propagate(paths: &LabPaths, args: PropagateArgs) -> Result<ExitCode> {
    let input = absolutize(paths.root(), &args.input);
    let output = match args.out {
        Some(out) => absolutize(paths.root(), &out),
        None => paths.outputs_dir().join(propagate::OUTPUT_FILE_NAME),
    };
    let sats = propagate::propagate_file(&input, &output, args.hours, args.step_min)?;
    println!("saved={} sats={sats}", output.display());
    Ok(ExitCode::SUCCESS)
}

fn run_baseline(paths: &LabPaths, args: BaselineArgs) -> Result<ExitCode> {
    let run_dir = match args.run_dir {
        Some(dir) => absolutize(paths.root(), &dir),
        None => baseline::latest_run_dir(paths)?,
    };
    let out = absolutize(paths.root(), &args.out);
    baseline::export_baseline(&run_dir, &out)?;
    println!("wrote={}", out.display());
    Ok(ExitCode::SUCCESS)
}
