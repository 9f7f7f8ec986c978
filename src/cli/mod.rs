//! Command-line parsing for the three tools.
//!
//! Only argument shapes live here. Selector validation that must happen
//! before any connection is made is exposed as methods so the app layer can
//! run it first.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::chain::DEFAULT_LOTUS_API;
use crate::clock::Zone;
use crate::error::AppError;
use crate::store::DEFAULT_DSN_FILE;

pub const SELECTOR_USAGE: &str = "Please provide either Miner or Cluster, but not both or neither.";

/// Interactive expiration report for one miner.
#[derive(Debug, Parser, Clone)]
#[command(name = "sector-report", version, about = "Sector expiration and pledge report for one miner")]
pub struct ReportCli {
    /// Node JSON-RPC endpoint.
    #[arg(short = 'l', long = "lotus-api", env = "LOTUS_API", default_value = DEFAULT_LOTUS_API)]
    pub lotus_api: String,

    /// Node API token.
    #[arg(long, env = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Print one detail line per sector.
    #[arg(short = 'v', long)]
    pub detail: bool,

    /// Miner address, e.g. f01000.
    #[arg(short = 'm', long)]
    pub miner: Option<String>,

    /// Cluster name, resolved through the store (e.g. xc64, hk01).
    #[arg(short = 'c', long)]
    pub cluster: Option<String>,

    /// Query chain state as of this time, e.g. "2023-11-01 00:00:00".
    ///
    /// The time is wall-clock time in the `--tz` zone, not UTC. Pass
    /// `--tz utc` to read it as UTC.
    #[arg(short = 'd', long)]
    pub date: Option<String>,

    /// Time zone for epoch/time conversion: `local`, `utc` or an offset like `+08:00`.
    ///
    /// Applies to the `-d` time as well as to printed dates.
    #[arg(long = "tz", env = "SECTOR_TZ", default_value = "local")]
    pub zone: Zone,

    /// File holding the store location, read when `-c` is used.
    #[arg(long = "dsn-file", default_value = DEFAULT_DSN_FILE)]
    pub dsn_file: PathBuf,
}

/// Which miner the report is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Miner(String),
    Cluster(String),
}

impl ReportCli {
    /// Exactly one of `-m`/`-c` must be given (empty strings count as absent).
    pub fn selector(&self) -> Result<Selector, AppError> {
        let miner = self.miner.as_deref().filter(|s| !s.is_empty());
        let cluster = self.cluster.as_deref().filter(|s| !s.is_empty());
        match (miner, cluster) {
            (Some(miner), None) => Ok(Selector::Miner(miner.to_string())),
            (None, Some(cluster)) => Ok(Selector::Cluster(cluster.to_string())),
            _ => Err(AppError::usage(SELECTOR_USAGE)),
        }
    }
}

/// Batch job: recompute today's summary for every known cluster.
#[derive(Debug, Parser, Clone)]
#[command(name = "sector-daily", version, about = "Write daily sector expiration summaries for all clusters")]
pub struct DailyCli {
    /// Node JSON-RPC endpoint.
    #[arg(short = 'l', long = "lotus-api", env = "LOTUS_API", default_value = DEFAULT_LOTUS_API)]
    pub lotus_api: String,

    /// Node API token.
    #[arg(long, env = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Store location (SQLite database path).
    #[arg(short = 'd', long)]
    pub dsn: String,

    /// Time zone for epoch/time conversion.
    #[arg(long = "tz", env = "SECTOR_TZ", default_value = "local")]
    pub zone: Zone,
}

#[derive(Debug, Parser, Clone)]
#[command(name = "rebuild-tool", version, about = "Sector rebuild metadata")]
pub struct RebuildCli {
    /// Node JSON-RPC endpoint.
    #[arg(long, env = "CHAIN", global = true)]
    pub chain: Option<String>,

    /// Node API token.
    #[arg(long, env = "TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: RebuildCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum RebuildCommand {
    /// Show rebuild info.
    Info(InfoArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct InfoArgs {
    /// Miner actor id (`f01000` or `1000`).
    #[arg(value_name = "MINER_ACTOR_ID")]
    pub miner: String,

    /// Sector number.
    #[arg(value_name = "SECTOR_NUMBER")]
    pub sector: String,

    /// Read pre-commit state and randomness at this height instead of the head.
    #[arg(long)]
    pub height: Option<i64>,
}

impl RebuildCli {
    pub fn chain(&self) -> Result<&str, AppError> {
        self.chain
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::usage("Required flag \"chain\" not set"))
    }
}
