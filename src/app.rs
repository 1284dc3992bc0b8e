//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments into a `RunConfig`
//! - takes the run lock on the cache directory
//! - builds the workbook and/or runs the prime-rate update
//! - prints a short summary

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Command, RunArgs};
use crate::data::HttpFetcher;
use crate::domain::RunConfig;
use crate::error::AppError;
use crate::io::RunLock;

pub mod pipeline;

/// Entry point for the `rate-ledger` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    // `rate-ledger` alone, or with only flags, means `rate-ledger run`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Build(args) => handle(&args, Steps { build: true, update: false }),
        Command::Update(args) => handle(&args, Steps { build: false, update: true }),
        Command::Run(args) => handle(&args, Steps { build: true, update: true }),
    }
}

#[derive(Debug, Clone, Copy)]
struct Steps {
    build: bool,
    update: bool,
}

fn handle(args: &RunArgs, steps: Steps) -> Result<(), AppError> {
    let config = run_config_from_args(args)?;
    let _lock = RunLock::acquire(&config.cache_dir)?;
    let fetcher = HttpFetcher::new(config.http_timeout_secs)?;

    tracing::info!(
        output = %config.output.display(),
        cache = %config.cache_dir.display(),
        today = %config.today,
        "starting run"
    );

    if steps.build {
        let output = pipeline::run_build(&config, &fetcher)?;
        println!("{}", crate::report::format_build_summary(&output, &config));
    }
    if steps.update {
        let output = pipeline::run_update(&config, &fetcher)?;
        println!("{}", crate::report::format_update_summary(&output));
    }
    Ok(())
}

pub fn run_config_from_args(args: &RunArgs) -> Result<RunConfig, AppError> {
    let today = args.today.unwrap_or_else(|| chrono::Local::now().date_naive());

    if args.http_timeout_secs == 0 {
        return Err(AppError::config("--http-timeout-secs must be positive"));
    }
    for (flag, start) in [("--boc-start", args.boc_start), ("--treasury-start", args.treasury_start)] {
        if start >= today {
            return Err(AppError::config(format!("{flag} {start} is not before today ({today})")));
        }
    }

    Ok(RunConfig {
        output: args.output.clone(),
        cache_dir: args.cache_dir.clone(),
        boc_start: args.boc_start,
        treasury_start: args.treasury_start,
        today,
        http_timeout_secs: args.http_timeout_secs,
    })
}

/// Logs go to stderr so the summary on stdout stays clean. `RUST_LOG`
/// overrides the default `info` level.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Rewrite argv so `rate-ledger` defaults to `rate-ledger run`.
///
/// Rules:
/// - `rate-ledger`                      -> `rate-ledger run`
/// - `rate-ledger --output x ...`       -> `rate-ledger run --output x ...`
/// - `rate-ledger --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_and_flags_default_to_run() {
        assert_eq!(rewrite_args(argv(&["rate-ledger"])), argv(&["rate-ledger", "run"]));
        assert_eq!(
            rewrite_args(argv(&["rate-ledger", "--output", "x"])),
            argv(&["rate-ledger", "run", "--output", "x"])
        );
        assert_eq!(rewrite_args(argv(&["rate-ledger", "--help"])), argv(&["rate-ledger", "--help"]));
        assert_eq!(rewrite_args(argv(&["rate-ledger", "build"])), argv(&["rate-ledger", "build"]));
    }

    fn args_with_today(today: &str) -> RunArgs {
        let cli = crate::cli::Cli::parse_from(["rate-ledger", "run", "--today", today]);
        match cli.command {
            Command::Run(args) => args,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn config_takes_explicit_today() {
        let config = run_config_from_args(&args_with_today("2022-06-16")).unwrap();
        assert_eq!(config.today, NaiveDate::from_ymd_opt(2022, 6, 16).unwrap());
        assert_eq!(config.boc_start, NaiveDate::from_ymd_opt(2014, 10, 24).unwrap());
    }

    #[test]
    fn start_after_today_is_a_config_error() {
        let err = run_config_from_args(&args_with_today("2015-01-01")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
        assert!(err.to_string().contains("--treasury-start"));
    }
}
