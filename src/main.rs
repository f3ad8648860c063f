mod commands;
mod read_election;

use crate::commands::{count, info, pack, run_packed};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(version, about = "Count multi-seat elections by single transferable vote")]
struct Opts {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate and dump info about an election file.
    Info {
        /// Election JSON file
        election: PathBuf,
    },
    /// Count an election file and print the winners.
    Count {
        /// Election JSON file
        election: PathBuf,
        /// Count through the exported C ABI instead of calling the tabulator directly
        #[clap(long)]
        abi: bool,
        /// Print the result as JSON
        #[clap(long)]
        json: bool,
        /// Override the tally comparison tolerance
        #[clap(long)]
        tolerance: Option<f64>,
    },
    /// Write the packed input buffer for an election file
    Pack {
        /// Election JSON file
        election: PathBuf,
        /// Output file of little-endian u32 words
        out: PathBuf,
    },
    /// Count a packed input buffer written by `pack`
    RunPacked {
        /// Packed input file
        packed: PathBuf,
        /// Number of seats to fill
        #[clap(long)]
        seats: u32,
        /// Number of candidates (ballot row width)
        #[clap(long)]
        candidates: u32,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();

    let result = match opts.command {
        Command::Info { election } => info(&election),
        Command::Count {
            election,
            abi,
            json,
            tolerance,
        } => count(&election, abi, json, tolerance),
        Command::Pack { election, out } => pack(&election, &out),
        Command::RunPacked {
            packed,
            seats,
            candidates,
        } => run_packed(&packed, seats, candidates),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "❌".red(), e.to_string().red());
        std::process::exit(1);
    }
}
