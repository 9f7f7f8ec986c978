//! Assemble the data a worker needs to re-seal a sector.

use std::io::Write;

use serde::Serialize;
use tracing::debug;

use crate::chain::{ChainApi, PRE_COMMIT_CHALLENGE_DELAY, Randomness, Seed, Ticket};
use crate::domain::{
    ActorId, Address, AllocationId, ChainEpoch, Cid, DealId, PaddedPieceSize, SectorNumber, TipSetKey,
};
use crate::error::AppError;
use crate::rebuild::{ReplicaCommitment, cid_to_replica_commitment};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SectorPublicInfo {
    pub comm_r: ReplicaCommitment,
    #[serde(rename = "SealedCID")]
    pub sealed_cid: Cid,
    pub activation: ChainEpoch,
    pub expiration: ChainEpoch,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PieceInfo {
    pub size: PaddedPieceSize,
    #[serde(rename = "PieceCID")]
    pub piece_cid: Cid,
}

#[derive(Debug, Clone, Serialize)]
pub struct DealInfo {
    #[serde(rename = "DealID")]
    pub deal_id: DealId,
    #[serde(rename = "PublishCid")]
    pub publish_cid: Option<Cid>,
    #[serde(rename = "AllocationID")]
    pub allocation_id: AllocationId,
    #[serde(rename = "PieceCID")]
    pub piece_cid: Cid,
    #[serde(rename = "PieceSize")]
    pub piece_size: PaddedPieceSize,
    #[serde(rename = "Client")]
    pub client: Address,
    #[serde(rename = "Provider")]
    pub provider: Address,
    #[serde(rename = "Offset")]
    pub offset: PaddedPieceSize,
    #[serde(rename = "Length")]
    pub length: PaddedPieceSize,
    #[serde(rename = "PayloadSize")]
    pub payload_size: u64,
    #[serde(rename = "StartEpoch")]
    pub start_epoch: ChainEpoch,
    #[serde(rename = "EndEpoch")]
    pub end_epoch: ChainEpoch,
    /// Legacy builtin-market deal when true, otherwise a direct (DDO) allocation.
    #[serde(rename = "IsBuiltinMarket")]
    pub is_builtin_market: bool,
    /// Workers use the piece data as-is instead of padding it themselves.
    #[serde(rename = "IsCompatible")]
    pub is_compatible: bool,
}

impl DealInfo {
    pub fn display_id(&self) -> String {
        if self.is_builtin_market {
            format!("builtinmarket({})", self.deal_id)
        } else {
            format!("ddo({})", self.allocation_id)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SectorPiece {
    pub piece: PieceInfo,
    pub deal_info: Option<DealInfo>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RebuildInfo {
    pub is_snap_up: bool,
    pub snap_up_public: SectorPublicInfo,
    pub ticket: Ticket,
    pub seed: Seed,
    pub pieces: Vec<SectorPiece>,
}

/// Which sector to describe, and at which height to read pre-commit state.
#[derive(Debug, Clone)]
pub struct RebuildRequest {
    pub miner: Address,
    pub actor: ActorId,
    pub sector: SectorNumber,
    /// `None` reads pre-commit state and randomness at the head.
    pub height: Option<ChainEpoch>,
}

/// Collect sector info, pre-commit randomness and pieces for one sector.
///
/// Sector info and deals are read at the head: at an older height (when the
/// pre-commit still exists) the sector may not be active yet.
pub fn build_rebuild_info<C: ChainApi>(chain: &C, req: &RebuildRequest) -> Result<RebuildInfo, AppError> {
    let head = TipSetKey::default();
    let tsk = match req.height {
        None | Some(0) => TipSetKey::default(),
        Some(height) => chain.chain_get_tipset_by_height(height, &head)?.key(),
    };

    let sector = chain
        .state_sector_get_info(&req.miner, req.sector, &head)?
        .ok_or_else(|| AppError::lookup(format!("sector {} of {} not found", req.sector, req.miner)))?;

    let precommit = chain
        .state_sector_precommit_info(&req.miner, req.sector, &tsk)?
        .ok_or_else(|| AppError::lookup("cannot find pre commit info"))?;

    let randomness = Randomness::new(chain);
    let ticket = randomness.get_ticket(&tsk, precommit.info.seal_rand_epoch, req.actor)?;
    let seed_epoch = precommit.pre_commit_epoch + PRE_COMMIT_CHALLENGE_DELAY;
    let seed = randomness.get_seed(&tsk, seed_epoch, req.actor)?;
    debug!(ticket_epoch = ticket.epoch, seed_epoch, "resolved sealing randomness");

    let comm_r = cid_to_replica_commitment(&sector.sealed_cid)
        .map_err(|e| e.context(format!("invalid sealed cid {}", sector.sealed_cid)))?;

    let mut pieces = Vec::with_capacity(sector.deal_ids.len());
    let mut offset: PaddedPieceSize = 0;
    for deal_id in &sector.deal_ids {
        let deal = chain
            .state_market_storage_deal(*deal_id, &head)
            .map_err(|e| e.context(format!("deal {deal_id} of sector {}", req.sector)))?;
        let proposal = deal.proposal;

        pieces.push(SectorPiece {
            piece: PieceInfo {
                size: proposal.piece_size,
                piece_cid: proposal.piece_cid.clone(),
            },
            deal_info: Some(DealInfo {
                deal_id: *deal_id,
                publish_cid: None,
                allocation_id: 0,
                piece_cid: proposal.piece_cid,
                piece_size: proposal.piece_size,
                client: proposal.client,
                provider: proposal.provider,
                offset,
                length: proposal.piece_size,
                payload_size: 0,
                start_epoch: proposal.start_epoch,
                end_epoch: proposal.end_epoch,
                is_builtin_market: false,
                is_compatible: true,
            }),
        });
        offset += proposal.piece_size;
    }

    Ok(RebuildInfo {
        is_snap_up: sector.sector_key_cid.is_some(),
        snap_up_public: SectorPublicInfo {
            comm_r,
            sealed_cid: sector.sealed_cid,
            activation: sector.activation,
            expiration: sector.expiration,
        },
        ticket,
        seed,
        pieces,
    })
}

/// Pretty JSON with tab indentation and a trailing newline.
pub fn write_json<W: Write, T: Serialize>(mut out: W, value: &T) -> Result<(), AppError> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| AppError::io(format!("output json: {e}")))?;
    writeln!(out).map_err(|e| AppError::io(format!("output json: {e}")))?;
    Ok(())
}
