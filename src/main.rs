//! param-sweep: run an external classifier once per value of a parameter sweep.
//!
//! Values come from a start/end/step range. Each one is appended to a fixed
//! command line and the resulting processes run on a fixed-size worker pool.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Parameter-sweep orchestrator
#[derive(Parser)]
#[command(name = "param-sweep")]
#[command(about = "Run an external binary once per sweep value on a fixed worker pool", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sweep
    ///
    /// Launches one process per sweep value, prints each argument vector
    /// before launch and each captured stdout after completion. Exits 0 once
    /// every task has completed, even if some of them failed.
    Run {
        #[command(flatten)]
        sweep: commands::SweepArgs,

        /// Disable colored summary output
        #[arg(long)]
        no_color: bool,
    },

    /// Show the tasks a sweep would run without launching anything
    Plan {
        #[command(flatten)]
        sweep: commands::SweepArgs,

        /// Number of argument vectors to print
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Write a starter sweep.toml with the reference configuration
    Init {
        /// Overwrite an existing sweep.toml
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run { sweep, no_color } => commands::run::execute(sweep, no_color),
        Commands::Plan { sweep, limit } => commands::plan::execute(sweep, limit),
        Commands::Init { force } => commands::init::execute(force),
    }
}

/// Install the global tracing subscriber. Logs go to stderr so stdout only
/// carries sweep output.
fn init_logging(verbose: bool) {
    let default_level = if verbose {
        "param_sweep=debug"
    } else {
        "param_sweep=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
