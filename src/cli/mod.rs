//! Command-line parsing for the interest-rate ledger.
//!
//! Argument parsing and dispatch stay here, away from the ledger code. Every
//! option can also come from the environment (or a `.env` file).

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "rate-ledger",
    version,
    about = "Bank of Canada, US Treasury and prime-rate history workbook"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rebuild the whole workbook from the sources (cached months are reused).
    Build(RunArgs),
    /// Fetch today's prime rates and fold them into the saved workbook.
    Update(RunArgs),
    /// `build` followed by `update` (the default).
    Run(RunArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Workbook directory; one CSV file per sheet is written there.
    #[arg(short, long, env = "RATE_LEDGER_OUTPUT", default_value = "ledger")]
    pub output: PathBuf,

    /// Directory for cached source responses.
    #[arg(long, env = "RATE_LEDGER_CACHE_DIR", default_value = "cache")]
    pub cache_dir: PathBuf,

    /// HTTP timeout in seconds for every request.
    #[arg(long, env = "RATE_LEDGER_HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// First day of the Bank of Canada sheet (YYYY-MM-DD).
    #[arg(long, default_value = "2014-10-24")]
    pub boc_start: NaiveDate,

    /// First day of the US Treasury sheet (YYYY-MM-DD).
    #[arg(long, default_value = "2015-06-19")]
    pub treasury_start: NaiveDate,

    /// Treat this date as today (YYYY-MM-DD); defaults to the local date.
    #[arg(long)]
    pub today: Option<NaiveDate>,
}
