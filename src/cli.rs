use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::OutputFormat;

#[derive(Parser)]
#[command(name = "txplan")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Plan ordered install, update and removal operations between package sets", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute the operations that turn the present set into the result set
    Plan(PlanArgs),

    /// Show the effective configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct PlanArgs {
    /// Package set file (TOML, or JSON by extension)
    pub file: PathBuf,

    /// Plan a lock-only transaction (no local install reordering)
    #[arg(long)]
    pub lock: bool,

    /// Output format (overrides the config file)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Config file to use instead of the default location
    #[arg(short, long, env = "TXPLAN_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Config file to use instead of the default location
    #[arg(short, long, env = "TXPLAN_CONFIG")]
    pub config: Option<PathBuf>,
}
