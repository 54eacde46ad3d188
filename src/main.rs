mod analysis;
mod config;
mod engine;
mod history;
mod manager;
mod model;
mod pathogen;
mod population;
mod social;
mod stats;
mod utils;
mod variate;

use crate::manager::Manager;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// Simulation directory containing `config.toml`.
    #[arg(long)]
    sim_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Simulate new runs, each in its own run directory.
    Create {
        #[arg(long, default_value_t = 1)]
        n_runs: usize,
    },

    /// Summarize the outcomes of all runs.
    Analyze,

    /// Remove all runs and analysis results.
    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.sim_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Create { n_runs } => {
            for _ in 0..n_runs {
                mgr.create_run()?;
            }
        }
        Command::Analyze => mgr.analyze_sim()?,
        Command::Clean => mgr.clean_sim()?,
    }

    Ok(())
}
