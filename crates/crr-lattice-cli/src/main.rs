mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::lattice::PriceArgs;

/// Cox-Ross-Rubinstein binomial lattice option pricing
#[derive(Parser)]
#[command(
    name = "crr",
    version,
    about = "Cox-Ross-Rubinstein binomial lattice option pricing",
    long_about = "Prices European and American vanilla puts and calls on a recombining \
                  binomial lattice with decimal precision. Reports node-by-node values, \
                  early-exercise decisions, and the exercise boundary."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log derived constants and run sizes to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Price puts and calls on the lattice and report every node
    Price(PriceArgs),
    /// Print put values as `(step, up_count): value`, one node per line
    PutValues(PriceArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(e: Box<dyn std::error::Error>) -> ! {
    eprintln!("{}: {}", "error".red().bold(), e);
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Price(args) => commands::lattice::run_price(args),
        Commands::PutValues(args) => match commands::lattice::run_put_values(args) {
            Ok(lines) => {
                for line in lines {
                    println!("{}", line);
                }
                process::exit(0);
            }
            Err(e) => fail(e),
        },
        Commands::Version => {
            println!("crr {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => fail(e),
    }
}
