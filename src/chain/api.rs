//! The node operations the tools depend on.

use serde::{Serialize, Serializer};

use crate::domain::{
    Address, ChainEpoch, DealId, MarketDeal, PreCommitOnChain, SectorNumber, SectorRecord, TipSet, TipSetKey,
};
use crate::error::AppError;

/// Epochs between pre-commit and the interactive seed (mainnet policy).
pub const PRE_COMMIT_CHALLENGE_DELAY: ChainEpoch = 150;

/// Randomness domain separation tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainSeparationTag {
    SealRandomness = 5,
    InteractiveSealChallengeSeed = 6,
}

impl Serialize for DomainSeparationTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(*self as i64)
    }
}

/// Read-only access to a full node.
///
/// An empty [`TipSetKey`] means "current head".
pub trait ChainApi {
    fn chain_head(&self) -> Result<TipSet, AppError>;

    fn chain_get_tipset_by_height(&self, height: ChainEpoch, tsk: &TipSetKey) -> Result<TipSet, AppError>;

    fn state_miner_active_sectors(&self, miner: &Address, tsk: &TipSetKey) -> Result<Vec<SectorRecord>, AppError>;

    fn state_market_storage_deal(&self, deal_id: DealId, tsk: &TipSetKey) -> Result<MarketDeal, AppError>;

    fn state_sector_get_info(
        &self,
        miner: &Address,
        sector: SectorNumber,
        tsk: &TipSetKey,
    ) -> Result<Option<SectorRecord>, AppError>;

    fn state_sector_precommit_info(
        &self,
        miner: &Address,
        sector: SectorNumber,
        tsk: &TipSetKey,
    ) -> Result<Option<PreCommitOnChain>, AppError>;

    fn state_get_randomness_from_tickets(
        &self,
        tag: DomainSeparationTag,
        epoch: ChainEpoch,
        entropy: &[u8],
        tsk: &TipSetKey,
    ) -> Result<Vec<u8>, AppError>;

    fn state_get_randomness_from_beacon(
        &self,
        tag: DomainSeparationTag,
        epoch: ChainEpoch,
        entropy: &[u8],
        tsk: &TipSetKey,
    ) -> Result<Vec<u8>, AppError>;
}

impl<T: ChainApi + ?Sized> ChainApi for &T {
    fn chain_head(&self) -> Result<TipSet, AppError> {
        (**self).chain_head()
    }

    fn chain_get_tipset_by_height(&self, height: ChainEpoch, tsk: &TipSetKey) -> Result<TipSet, AppError> {
        (**self).chain_get_tipset_by_height(height, tsk)
    }

    fn state_miner_active_sectors(&self, miner: &Address, tsk: &TipSetKey) -> Result<Vec<SectorRecord>, AppError> {
        (**self).state_miner_active_sectors(miner, tsk)
    }

    fn state_market_storage_deal(&self, deal_id: DealId, tsk: &TipSetKey) -> Result<MarketDeal, AppError> {
        (**self).state_market_storage_deal(deal_id, tsk)
    }

    fn state_sector_get_info(
        &self,
        miner: &Address,
        sector: SectorNumber,
        tsk: &TipSetKey,
    ) -> Result<Option<SectorRecord>, AppError> {
        (**self).state_sector_get_info(miner, sector, tsk)
    }

    fn state_sector_precommit_info(
        &self,
        miner: &Address,
        sector: SectorNumber,
        tsk: &TipSetKey,
    ) -> Result<Option<PreCommitOnChain>, AppError> {
        (**self).state_sector_precommit_info(miner, sector, tsk)
    }

    fn state_get_randomness_from_tickets(
        &self,
        tag: DomainSeparationTag,
        epoch: ChainEpoch,
        entropy: &[u8],
        tsk: &TipSetKey,
    ) -> Result<Vec<u8>, AppError> {
        (**self).state_get_randomness_from_tickets(tag, epoch, entropy, tsk)
    }

    fn state_get_randomness_from_beacon(
        &self,
        tag: DomainSeparationTag,
        epoch: ChainEpoch,
        entropy: &[u8],
        tsk: &TipSetKey,
    ) -> Result<Vec<u8>, AppError> {
        (**self).state_get_randomness_from_beacon(tag, epoch, entropy, tsk)
    }
}
