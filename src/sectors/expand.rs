//! Per-sector detail: deal start epochs and expandability.

use tracing::warn;

use crate::chain::ChainApi;
use crate::domain::{ChainEpoch, SectorRecord, TipSetKey};
use crate::sectors::{SectorKind, classify};

/// Deals must start after this epoch for a sector to be expandable.
pub const EXPANDABLE_START_EPOCH_THRESHOLD: ChainEpoch = 2_383_680;

#[derive(Debug, Clone)]
pub struct SectorDetail {
    pub sector: SectorRecord,
    pub kind: SectorKind,
    pub deal_start_epochs: Vec<ChainEpoch>,
    pub expandable: bool,
}

/// True iff there is at least one deal and every deal starts after the threshold.
pub fn is_expandable(deal_start_epochs: &[ChainEpoch]) -> bool {
    !deal_start_epochs.is_empty()
        && deal_start_epochs
            .iter()
            .all(|epoch| *epoch > EXPANDABLE_START_EPOCH_THRESHOLD)
}

/// Look up each deal of `sector` and resolve its expandability.
///
/// Deals that cannot be fetched are logged and left out of the start epochs.
/// A sector with any unresolved deal is not expandable.
pub fn resolve_detail<C: ChainApi>(chain: &C, sector: &SectorRecord, tsk: &TipSetKey) -> SectorDetail {
    let mut unresolved = 0usize;
    let mut deal_start_epochs = Vec::with_capacity(sector.deal_ids.len());
    for deal_id in &sector.deal_ids {
        match chain.state_market_storage_deal(*deal_id, tsk) {
            Ok(deal) => deal_start_epochs.push(deal.proposal.start_epoch),
            Err(err) => {
                warn!(sector = sector.sector_number, deal = *deal_id, "failed to get deal info: {err}");
                unresolved += 1;
            }
        }
    }

    SectorDetail {
        sector: sector.clone(),
        kind: classify(sector.deal_weight, sector.verified_deal_weight),
        expandable: unresolved == 0 && is_expandable(&deal_start_epochs),
        deal_start_epochs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::chain::testing::FakeChain;
    use crate::domain::{Address, Cid, DealWeight, TokenAmount};

    fn sector_with_deals(deal_ids: Vec<u64>) -> SectorRecord {
        SectorRecord {
            sector_number: 9,
            sealed_cid: Cid::new("bagboea4b5abc"),
            deal_ids,
            activation: 2_000_000,
            expiration: 3_000_000,
            deal_weight: DealWeight::ZERO,
            verified_deal_weight: DealWeight::new(1),
            initial_pledge: TokenAmount::from_whole(1),
            sector_key_cid: None,
        }
    }

    #[test]
    fn expandable_requires_all_deals_after_threshold() {
        assert!(is_expandable(&[2_383_681, 2_400_000]));
        assert!(!is_expandable(&[2_383_681, EXPANDABLE_START_EPOCH_THRESHOLD]));
        assert!(!is_expandable(&[]));
    }

    #[test]
    fn resolves_start_epochs_of_every_deal() {
        let provider = Address::new_id(1000);
        let chain = FakeChain::default()
            .with_deal(1, provider.clone(), 2_400_000)
            .with_deal(2, provider, 2_500_000);

        let detail = resolve_detail(&chain, &sector_with_deals(vec![1, 2]), &TipSetKey::default());
        assert_eq!(detail.deal_start_epochs, vec![2_400_000, 2_500_000]);
        assert!(detail.expandable);
        assert_eq!(detail.kind, SectorKind::DealBacked);
    }

    #[test]
    fn one_failed_deal_lookup_makes_the_sector_not_expandable() {
        let chain = FakeChain::default().with_deal(1, Address::new_id(1000), 2_400_000);

        let partial = resolve_detail(&chain, &sector_with_deals(vec![1, 2]), &TipSetKey::default());
        assert_eq!(partial.deal_start_epochs, vec![2_400_000]);
        assert!(!partial.expandable);

        let all_failed = resolve_detail(&chain, &sector_with_deals(vec![2]), &TipSetKey::default());
        assert_eq!(all_failed.expandable, partial.expandable);
    }

    #[test]
    fn sector_whose_deals_all_fail_is_not_expandable() {
        let chain = FakeChain::default();
        let detail = resolve_detail(&chain, &sector_with_deals(vec![5]), &TipSetKey::default());
        assert!(detail.deal_start_epochs.is_empty());
        assert!(!detail.expandable);
    }

    #[test]
    fn sector_without_deals_makes_no_calls() {
        let chain = FakeChain::default();
        let detail = resolve_detail(&chain, &sector_with_deals(Vec::new()), &TipSetKey::default());
        assert!(!detail.expandable);
        assert_eq!(chain.calls(), 0);
    }
}
