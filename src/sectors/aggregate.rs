//! Group sectors by expiration day and total count/pledge per kind.
//!
//! Aggregation is a commutative fold over `(day, kind, pledge)` triples with
//! exact integer pledge sums, so input order never changes the result.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::warn;

use crate::clock::ChainClock;
use crate::domain::{Fil, SectorRecord, TokenAmount};
use crate::sectors::{SectorKind, classify, pledge_to_whole};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindTotals {
    pub count: u64,
    pub pledge: Fil,
}

impl KindTotals {
    fn add(&mut self, other: KindTotals) {
        self.count += other.count;
        self.pledge += other.pledge;
    }
}

/// Per-kind totals for one expiration day (or for the whole run).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DailyAggregate {
    pub committed_capacity: KindTotals,
    pub deal_backed: KindTotals,
    pub ordinary_deal: KindTotals,
    pub unclassified: KindTotals,
}

impl DailyAggregate {
    pub fn get(&self, kind: SectorKind) -> KindTotals {
        match kind {
            SectorKind::CommittedCapacity => self.committed_capacity,
            SectorKind::DealBacked => self.deal_backed,
            SectorKind::OrdinaryDeal => self.ordinary_deal,
            SectorKind::Unclassified => self.unclassified,
        }
    }

    fn get_mut(&mut self, kind: SectorKind) -> &mut KindTotals {
        match kind {
            SectorKind::CommittedCapacity => &mut self.committed_capacity,
            SectorKind::DealBacked => &mut self.deal_backed,
            SectorKind::OrdinaryDeal => &mut self.ordinary_deal,
            SectorKind::Unclassified => &mut self.unclassified,
        }
    }

    pub fn record(&mut self, kind: SectorKind, pledge: Fil) {
        self.get_mut(kind).add(KindTotals { count: 1, pledge });
    }

    /// Sum over all kinds.
    pub fn total(&self) -> KindTotals {
        let mut total = KindTotals::default();
        for kind in SectorKind::ALL {
            total.add(self.get(kind));
        }
        total
    }
}

/// Result of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectorAggregation {
    days: BTreeMap<NaiveDate, DailyAggregate>,
    totals: DailyAggregate,
}

impl SectorAggregation {
    pub fn record(&mut self, day: NaiveDate, kind: SectorKind, pledge: Fil) {
        self.days.entry(day).or_default().record(kind, pledge);
        self.totals.record(kind, pledge);
    }

    /// Buckets in ascending date order.
    pub fn days(&self) -> impl Iterator<Item = (&NaiveDate, &DailyAggregate)> {
        self.days.iter()
    }

    pub fn day(&self, day: NaiveDate) -> Option<&DailyAggregate> {
        self.days.get(&day)
    }

    pub fn totals(&self) -> &DailyAggregate {
        &self.totals
    }
}

/// Classify each sector and bucket it by its expiration day.
pub fn aggregate(sectors: &[SectorRecord], clock: &ChainClock) -> SectorAggregation {
    sectors.iter().fold(SectorAggregation::default(), |mut acc, sector| {
        let kind = classify(sector.deal_weight, sector.verified_deal_weight);
        if kind == SectorKind::Unclassified {
            warn!(
                sector = sector.sector_number,
                deal_weight = %sector.deal_weight,
                verified_deal_weight = %sector.verified_deal_weight,
                "sector carries both deal weight and verified deal weight; counted as unclassified"
            );
        }
        acc.record(
            clock.epoch_to_day(sector.expiration),
            kind,
            pledge_to_whole(sector.initial_pledge),
        );
        acc
    })
}

/// Total raw pledge across all sectors, in base units.
pub fn total_pledge(sectors: &[SectorRecord]) -> TokenAmount {
    sectors.iter().map(|s| s.initial_pledge).sum()
}
