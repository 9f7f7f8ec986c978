//! In-process `ChainApi` used by unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use crate::chain::{ChainApi, DomainSeparationTag};
use crate::domain::{
    Address, ChainEpoch, Cid, DealId, DealProposal, MarketDeal, PreCommitInfo, PreCommitOnChain, SectorNumber,
    SectorRecord, TipSet, TipSetKey, TokenAmount,
};
use crate::error::AppError;

#[derive(Default)]
pub struct FakeChain {
    head: Option<TipSet>,
    tipsets: HashMap<ChainEpoch, TipSet>,
    sectors: HashMap<String, Vec<SectorRecord>>,
    failing_miners: HashSet<String>,
    unreachable: bool,
    deals: HashMap<DealId, MarketDeal>,
    precommits: HashMap<(String, SectorNumber), PreCommitOnChain>,
    calls: Cell<usize>,
    last_tsk: RefCell<Option<TipSetKey>>,
}

impl FakeChain {
    pub fn with_head(mut self, height: ChainEpoch, cid: &str) -> Self {
        self.head = Some(TipSet {
            cids: vec![Cid::new(cid)],
            height,
        });
        self
    }

    pub fn with_tipset(mut self, height: ChainEpoch, cid: &str) -> Self {
        self.tipsets.insert(
            height,
            TipSet {
                cids: vec![Cid::new(cid)],
                height,
            },
        );
        self
    }

    pub fn with_sectors(mut self, miner: &str, sectors: Vec<SectorRecord>) -> Self {
        self.sectors.insert(miner.to_string(), sectors);
        self
    }

    pub fn with_failing_miner(mut self, miner: &str) -> Self {
        self.failing_miners.insert(miner.to_string());
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub fn with_deal(mut self, deal_id: DealId, provider: Address, start_epoch: ChainEpoch) -> Self {
        self.deals.insert(
            deal_id,
            MarketDeal {
                proposal: DealProposal {
                    piece_cid: Cid::new(format!("baga6ea4seaq{deal_id}")),
                    piece_size: 32 << 30,
                    verified_deal: true,
                    client: Address::new_id(2000 + deal_id),
                    provider,
                    start_epoch,
                    end_epoch: start_epoch + 1_000_000,
                },
            },
        );
        self
    }

    pub fn with_precommit(mut self, miner: &str, sector: SectorNumber, seal_rand_epoch: ChainEpoch, epoch: ChainEpoch) -> Self {
        self.precommits.insert(
            (miner.to_string(), sector),
            PreCommitOnChain {
                info: PreCommitInfo {
                    sector_number: sector,
                    sealed_cid: Cid::new("bagboea4b5abc"),
                    seal_rand_epoch,
                    deal_ids: Vec::new(),
                    expiration: epoch + 1_000_000,
                },
                pre_commit_deposit: TokenAmount::from_whole(1),
                pre_commit_epoch: epoch,
            },
        );
        self
    }

    /// Number of calls made through the trait.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Tipset key passed to the most recent call.
    pub fn last_tipset_key(&self) -> Option<TipSetKey> {
        self.last_tsk.borrow().clone()
    }

    fn enter(&self, tsk: Option<&TipSetKey>) -> Result<(), AppError> {
        self.calls.set(self.calls.get() + 1);
        if let Some(tsk) = tsk {
            *self.last_tsk.borrow_mut() = Some(tsk.clone());
        }
        if self.unreachable {
            return Err(AppError::connection("connection refused"));
        }
        Ok(())
    }

    fn fake_randomness(tag: DomainSeparationTag, epoch: ChainEpoch) -> Vec<u8> {
        let mut out = vec![tag as u8; 32];
        out[..8].copy_from_slice(&epoch.to_be_bytes());
        out
    }
}

impl ChainApi for FakeChain {
    fn chain_head(&self) -> Result<TipSet, AppError> {
        self.enter(None)?;
        self.head
            .clone()
            .ok_or_else(|| AppError::rpc("ChainHead", "no head"))
    }

    fn chain_get_tipset_by_height(&self, height: ChainEpoch, tsk: &TipSetKey) -> Result<TipSet, AppError> {
        self.enter(Some(tsk))?;
        self.tipsets
            .get(&height)
            .cloned()
            .ok_or_else(|| AppError::rpc("ChainGetTipSetByHeight", format!("no tipset at {height}")))
    }

    fn state_miner_active_sectors(&self, miner: &Address, tsk: &TipSetKey) -> Result<Vec<SectorRecord>, AppError> {
        self.enter(Some(tsk))?;
        let key = miner.to_string();
        if self.failing_miners.contains(&key) {
            return Err(AppError::rpc("StateMinerActiveSectors", "actor not found"));
        }
        Ok(self.sectors.get(&key).cloned().unwrap_or_default())
    }

    fn state_market_storage_deal(&self, deal_id: DealId, tsk: &TipSetKey) -> Result<MarketDeal, AppError> {
        self.enter(Some(tsk))?;
        self.deals
            .get(&deal_id)
            .cloned()
            .ok_or_else(|| AppError::rpc("StateMarketStorageDeal", format!("deal {deal_id} not found")))
    }

    fn state_sector_get_info(
        &self,
        miner: &Address,
        sector: SectorNumber,
        tsk: &TipSetKey,
    ) -> Result<Option<SectorRecord>, AppError> {
        self.enter(Some(tsk))?;
        Ok(self
            .sectors
            .get(&miner.to_string())
            .and_then(|sectors| sectors.iter().find(|s| s.sector_number == sector))
            .cloned())
    }

    fn state_sector_precommit_info(
        &self,
        miner: &Address,
        sector: SectorNumber,
        tsk: &TipSetKey,
    ) -> Result<Option<PreCommitOnChain>, AppError> {
        self.enter(Some(tsk))?;
        Ok(self.precommits.get(&(miner.to_string(), sector)).cloned())
    }

    fn state_get_randomness_from_tickets(
        &self,
        tag: DomainSeparationTag,
        epoch: ChainEpoch,
        _entropy: &[u8],
        tsk: &TipSetKey,
    ) -> Result<Vec<u8>, AppError> {
        self.enter(Some(tsk))?;
        Ok(Self::fake_randomness(tag, epoch))
    }

    fn state_get_randomness_from_beacon(
        &self,
        tag: DomainSeparationTag,
        epoch: ChainEpoch,
        _entropy: &[u8],
        tsk: &TipSetKey,
    ) -> Result<Vec<u8>, AppError> {
        self.enter(Some(tsk))?;
        Ok(Self::fake_randomness(tag, epoch))
    }
}
