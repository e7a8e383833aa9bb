//! # Ledger Node
//!
//! Operator CLI for an on-disk invoice ledger.
//!
//! ```sh
//! LEDGER_SIGNING_KEY=$(openssl rand -hex 32) ledger-node register 42 invoice-42.json
//! ledger-node verify 42 invoice-42.json
//! ledger-node audit 42
//! ledger-node validate
//! ```
//!
//! Configuration comes from the environment (see `config`); `--data-dir`
//! overrides `LEDGER_DATA_DIR`.

mod commands;
mod config;
mod node;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use ledger_telemetry::{init_telemetry, TelemetryConfig};

use crate::commands::Command;
use crate::config::NodeConfig;
use crate::node::LedgerNode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the chain, registry entries and lock file.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())?;

    let mut config = NodeConfig::from_env().context("reading configuration")?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    let node = LedgerNode::open(&config)?;
    cli.command.run(&node).await
}
