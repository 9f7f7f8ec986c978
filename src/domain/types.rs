//! Chain records as returned by the node's JSON-RPC API.
//!
//! Field names follow the node's PascalCase JSON. Only the fields the tools
//! read are modelled; everything else in the payload is ignored.

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{Address, Cid, DealWeight, TokenAmount};

/// Chain height. One epoch is 30 seconds.
pub type ChainEpoch = i64;
pub type ActorId = u64;
pub type SectorNumber = u64;
pub type DealId = u64;
pub type AllocationId = u64;
pub type PaddedPieceSize = u64;

/// A reference to a point in chain history. Empty means "current head".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TipSetKey(Vec<Cid>);

impl TipSetKey {
    pub fn new(cids: Vec<Cid>) -> Self {
        Self(cids)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn cids(&self) -> &[Cid] {
        &self.0
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TipSet {
    pub cids: Vec<Cid>,
    pub height: ChainEpoch,
}

impl TipSet {
    pub fn key(&self) -> TipSetKey {
        TipSetKey::new(self.cids.clone())
    }
}

/// One on-chain sector snapshot (`SectorOnChainInfo`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SectorRecord {
    pub sector_number: SectorNumber,
    #[serde(rename = "SealedCID")]
    pub sealed_cid: Cid,
    /// Newer actors publish this as `DeprecatedDealIDs`.
    #[serde(rename = "DealIDs", alias = "DeprecatedDealIDs", default, deserialize_with = "null_as_empty")]
    pub deal_ids: Vec<DealId>,
    pub activation: ChainEpoch,
    pub expiration: ChainEpoch,
    pub deal_weight: DealWeight,
    pub verified_deal_weight: DealWeight,
    pub initial_pledge: TokenAmount,
    #[serde(rename = "SectorKeyCID", default)]
    pub sector_key_cid: Option<Cid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DealProposal {
    #[serde(rename = "PieceCID")]
    pub piece_cid: Cid,
    pub piece_size: PaddedPieceSize,
    #[serde(default)]
    pub verified_deal: bool,
    pub client: Address,
    pub provider: Address,
    pub start_epoch: ChainEpoch,
    pub end_epoch: ChainEpoch,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketDeal {
    pub proposal: DealProposal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PreCommitInfo {
    pub sector_number: SectorNumber,
    #[serde(rename = "SealedCID")]
    pub sealed_cid: Cid,
    pub seal_rand_epoch: ChainEpoch,
    #[serde(rename = "DealIDs", default, deserialize_with = "null_as_empty")]
    pub deal_ids: Vec<DealId>,
    pub expiration: ChainEpoch,
}

/// `SectorPreCommitOnChainInfo`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PreCommitOnChain {
    pub info: PreCommitInfo,
    pub pre_commit_deposit: TokenAmount,
    pub pre_commit_epoch: ChainEpoch,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
