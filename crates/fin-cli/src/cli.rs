use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(
    name = "fin-ledger",
    about = "Statement ledger: balances derived from an append-only statement log",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format; overrides the config file
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Execute a ledger script against in-memory collaborators
    Run(RunArgs),
    /// Walk through deposit, withdraw, overdraft and a concurrent withdraw race
    Demo,
}

#[derive(Args)]
pub struct RunArgs {
    /// Script file (TOML)
    pub script: PathBuf,
}
