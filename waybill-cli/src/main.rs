//! Waybill CLI - trip records and leaderboards over JSON-file stores.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use waybill_core::{Amount, Platform, RankAxis, Segment};

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage error (invalid arguments)
  65  Data error (duplicate proof, invalid trip)
  66  Input file not found
  74  I/O error (store not readable or writable)";

#[derive(Parser)]
#[command(name = "waybill")]
#[command(author, version, about = "Trip records and leaderboards for trucking simulator communities", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print nothing but errors and requested data
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Locations of the JSON stores
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Trip collection file (created on first submission)
    #[arg(long, env = "WAYBILL_STORE", default_value = "trips.json")]
    pub store: PathBuf,

    /// Profile list file (JSON array)
    #[arg(long, env = "WAYBILL_PROFILES", default_value = "profiles.json")]
    pub profiles: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SHA-256 fingerprint of one or more proof images
    Fingerprint {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Record a trip proved by a departure and an arrival screenshot
    Submit {
        #[command(flatten)]
        stores: StoreArgs,

        /// Profile id of the submitting driver
        #[arg(long)]
        driver: String,

        #[arg(long)]
        origin: String,

        #[arg(long)]
        destination: String,

        /// Trip date, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,

        /// Trip value, e.g. 1500, 1500.00 or 1.500,00
        #[arg(long)]
        value: Amount,

        /// WTDS, WBDS, GTO, TOE3 or ETS2
        #[arg(long)]
        platform: Platform,

        /// TRUCK, BUS or BOTH
        #[arg(long, default_value = "TRUCK")]
        segment: Segment,

        /// Departure screenshot
        #[arg(long, value_name = "FILE")]
        initial: PathBuf,

        /// Arrival screenshot
        #[arg(long = "final", value_name = "FILE")]
        final_proof: PathBuf,

        /// Emit the stored trip as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute a leaderboard
    Ranking {
        #[command(flatten)]
        stores: StoreArgs,

        /// DRIVER, ENTREPRENEUR, GROUPING or AUTONOMOUS
        #[arg(long, default_value = "DRIVER")]
        axis: RankAxis,

        /// WTDS, WBDS, GTO, TOE3 or ETS2
        #[arg(long)]
        platform: Platform,

        /// TRUCK, BUS or BOTH (matches every segment)
        #[arg(long, default_value = "BOTH")]
        segment: Segment,

        /// Case-insensitive match on name or company name
        #[arg(long, default_value = "")]
        search: String,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List the trips a profile may see
    Trips {
        #[command(flatten)]
        stores: StoreArgs,

        /// Profile id of the viewer
        #[arg(long, required_unless_present = "admin")]
        viewer: Option<String>,

        /// List every trip
        #[arg(long)]
        admin: bool,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "waybill=debug,waybill_core=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_tracing(cli.verbose, cli.quiet);
    let quiet = cli.quiet;

    let result = match cli.command {
        Commands::Fingerprint { files, json } => commands::fingerprint::execute(files, json).await,
        Commands::Submit {
            stores,
            driver,
            origin,
            destination,
            date,
            value,
            platform,
            segment,
            initial,
            final_proof,
            json,
        } => {
            let args = commands::submit::SubmitArgs {
                driver,
                origin,
                destination,
                date,
                value,
                platform,
                segment,
                initial,
                final_proof,
            };
            commands::submit::execute(stores, args, json, quiet).await
        }
        Commands::Ranking {
            stores,
            axis,
            platform,
            segment,
            search,
            json,
        } => commands::ranking::execute(stores, axis, platform, segment, search, json).await,
        Commands::Trips {
            stores,
            viewer,
            admin,
            json,
        } => commands::trips::execute(stores, viewer, admin, json).await,
    };

    if let Err(err) = result {
        let exit = ExitCode::from_anyhow(&err);
        if let Some(message) = exit.message {
            eprintln!("{} {}", "Error:".red().bold(), message);
        }
        std::process::exit(exit.code);
    }
}
