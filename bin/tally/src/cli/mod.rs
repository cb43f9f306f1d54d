use std::{num::NonZeroUsize, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use tally_consensus::revision::Revision;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        match &self.command {
            Commands::Rewards(cmd) => cmd.verbosity,
            Commands::Summary(cmd) => cmd.verbosity,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compute the maximum reward of every validator for one epoch
    #[command(name = "rewards")]
    Rewards(RewardsCommand),

    /// Summarize participation and missed slots of one state
    #[command(name = "summary")]
    Summary(SummaryCommand),
}

/// Where to find states and duties, shared by every subcommand.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Directory holding one ``<epoch>.yaml`` duties file per epoch
    #[arg(long, env = "TALLY_DUTIES_DIR")]
    pub duties: PathBuf,

    /// Revision of ``.ssz`` and ``.ssz_snappy`` state files
    #[arg(long, env = "TALLY_REVISION")]
    pub revision: Option<Revision>,

    /// Write YAML output to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct RewardsCommand {
    /// State at the last slot of the epoch before the evaluated one
    #[arg(long)]
    pub previous: PathBuf,

    /// State at the last slot of the evaluated epoch
    #[arg(long)]
    pub current: PathBuf,

    /// State at the last slot of the epoch after the evaluated one
    #[arg(long)]
    pub next: PathBuf,

    #[command(flatten)]
    pub input: InputArgs,

    /// Only report these validator indices
    #[arg(long, value_delimiter = ',')]
    pub validators: Option<Vec<u64>>,

    /// Number of validators computed per blocking task
    #[arg(long, env = "TALLY_CHUNK_SIZE", default_value = "1024")]
    pub chunk_size: NonZeroUsize,

    /// Number of worker threads, defaults to the number of cores
    #[arg(long, env = "TALLY_WORKERS")]
    pub workers: Option<NonZeroUsize>,

    /// Verbosity level
    #[arg(short, long, default_value_t = 3)]
    pub verbosity: u8,
}

#[derive(Debug, Parser)]
pub struct SummaryCommand {
    /// State to summarize
    #[arg(long)]
    pub state: PathBuf,

    #[command(flatten)]
    pub input: InputArgs,

    /// Verbosity level
    #[arg(short, long, default_value_t = 3)]
    pub verbosity: u8,
}

/// Log filter used when ``RUST_LOG`` is not set.
pub fn log_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "off",
        1 => "error",
        2 => "warn",
        3 => "info",
        4 => "debug",
        _ => "trace",
    }
}
