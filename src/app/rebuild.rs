//! `rebuild-tool`: print the metadata needed to re-seal a sector.

use std::io::{self, Write};

use clap::Parser;
use tracing::info;

use crate::app::load_env;
use crate::chain::{ChainApi, LotusClient};
use crate::cli::{InfoArgs, RebuildCli, RebuildCommand};
use crate::domain::{should_actor, should_address, should_sector_number};
use crate::error::AppError;
use crate::rebuild::{RebuildRequest, build_rebuild_info, write_json};

/// Entry point for the `rebuild-tool` binary.
pub fn run() -> Result<(), AppError> {
    load_env();
    let cli = RebuildCli::parse();
    match &cli.command {
        RebuildCommand::Info(args) => {
            let req = info_request(args)?;
            let chain = LotusClient::connect(cli.chain()?, cli.token.as_deref())?;
            info!(endpoint = chain.endpoint(), miner = %req.miner, sector = req.sector, "fetching rebuild info");
            let stdout = io::stdout();
            print_info(&chain, &req, &mut stdout.lock())
        }
    }
}

/// Validate the positional arguments of `info`.
pub fn info_request(args: &InfoArgs) -> Result<RebuildRequest, AppError> {
    let miner = should_address(&args.miner, true, true).map_err(|e| e.context("invalid miner actor id"))?;
    let actor = should_actor(&args.miner, true).map_err(|e| e.context("invalid miner actor id"))?;
    let sector = should_sector_number(&args.sector)?;
    Ok(RebuildRequest {
        miner,
        actor,
        sector,
        height: args.height,
    })
}

pub fn print_info<C: ChainApi, W: Write>(chain: &C, req: &RebuildRequest, out: &mut W) -> Result<(), AppError> {
    let info = build_rebuild_info(chain, req)?;
    write_json(out, &info)
}
