use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use gapverify::config::VerifyConfig;

mod commands;
mod doctor;
mod format;
mod telemetry;

use format::OutputFormat;

/// Prime gap verifier
///
/// Proves that START and START+GAP are consecutive primes: both endpoints
/// are (probable) primes and every integer strictly between them is
/// composite.
///
/// Numbers may be written in decimal or as expressions:
///
///   gapverify validate 360653 96
///   gapverify is-prime "503# - 659"
///
/// Numbers of 8000 bits or more are handed to pfgw64, which must be on PATH
/// (see 'gapverify doctor').
#[derive(Parser)]
#[command(name = "gapverify")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'gapverify <command> --help' for more information on a specific command.")]
struct Cli {
    /// Configuration file (TOML); defaults apply when omitted or missing
    #[arg(long, global = true, env = "GAPVERIFY_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t)]
    format: OutputFormat,

    /// Log progress and sieve statistics
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sieve [START, START+GAP] and report what is left
    Sieve {
        /// First number of the interval
        start: String,
        /// Interval length
        gap: u64,
        /// Sieve with primes up to this bound (default: estimated)
        #[arg(long)]
        max_prime: Option<u64>,
        /// Print every unknown offset
        #[arg(long)]
        list: bool,
    },

    /// Validate a claimed prime gap
    ///
    /// Exits with status 1 when the gap does not verify.
    Validate {
        /// Lower prime
        start: String,
        /// Gap length; the upper prime is START+GAP
        gap: u64,
        /// Sieve with primes up to this bound (default: estimated)
        #[arg(long)]
        max_prime: Option<u64>,
        /// Worker threads for survivor tests (default: from config)
        #[arg(short = 'j', long)]
        threads: Option<usize>,
    },

    /// Test one number for (probable) primality
    IsPrime {
        /// Number or expression
        expr: String,
    },

    /// Show the estimated sieve bound for an interval
    Limit {
        start: String,
        gap: u64,
    },

    /// Parse a number expression and print its value
    Parse {
        expr: String,
    },

    /// Check configuration and the external PRP tool
    Doctor,

    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let format = cli.format;

    match cli.command {
        Commands::Sieve {
            start,
            gap,
            max_prime,
            list,
        } => commands::sieve(&start, gap, max_prime, list, format),
        Commands::Validate {
            start,
            gap,
            max_prime,
            threads,
        } => {
            let options = gapverify::ValidateOptions {
                max_prime,
                verbose: cli.verbose,
                threads: threads.unwrap_or(config.validate.threads),
            };
            commands::validate(&config, &start, gap, &options, format)
        }
        Commands::IsPrime { expr } => commands::is_prime(&config, &expr, format),
        Commands::Limit { start, gap } => commands::limit(&start, gap, format),
        Commands::Parse { expr } => commands::parse(&expr, format),
        Commands::Doctor => doctor::run(&config, cli.config.as_deref(), format),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "gapverify", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<VerifyConfig> {
    let Some(path) = path else {
        return Ok(VerifyConfig::default());
    };
    VerifyConfig::load(path).with_context(|| format!("loading configuration from {}", path.display()))
}
