//! sysio-testutil - Main Entry Point
//!
//! Exposes the harness utilities to shell-driven test scripts: structural
//! comparison, JSON extraction, port checks, block log access and asset
//! arithmetic.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

mod commands;
mod output;

use commands::{amount, block_log, chain, compare, ports};
use sysio_harness::HarnessConfig;

/// Sysio test harness utilities
#[derive(Parser)]
#[command(name = "sysio-testutil")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Harness configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Structurally compare two JSON files
    Compare(compare::CompareArgs),

    /// Extract the JSON document from noisy text
    ExtractJson(compare::ExtractJsonArgs),

    /// Check whether ports are free on 127.0.0.1
    Ports(ports::PortsArgs),

    /// Run a block-log utility action
    BlockLog(block_log::BlockLogArgs),

    /// Asset amount arithmetic
    #[command(subcommand)]
    Amount(amount::AmountCommands),

    /// List chain sync strategies
    SyncStrategies,

    /// Show the node server's full version
    ServerVersion,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    sysio_harness::logging::init(cli.verbose);

    let config = match &cli.config {
        Some(path) => HarnessConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => HarnessConfig::default(),
    };
    let config = if cli.verbose { config.with_debug(true) } else { config };
    debug!("Harness config: {:?}", config);

    match cli.command {
        Commands::Compare(args) => {
            if !compare::execute_compare(args, cli.format)? {
                output::print_error("Documents differ");
                std::process::exit(1);
            }
        }
        Commands::ExtractJson(args) => compare::execute_extract(args, cli.format)?,
        Commands::Ports(args) => {
            if !ports::execute(args, cli.format)? {
                std::process::exit(1);
            }
        }
        Commands::BlockLog(args) => block_log::execute(args, config, cli.format)?,
        Commands::Amount(cmd) => amount::execute(cmd, cli.format)?,
        Commands::SyncStrategies => chain::list_strategies(cli.format)?,
        Commands::ServerVersion => chain::server_version(config, cli.format)?,
    }

    Ok(())
}
