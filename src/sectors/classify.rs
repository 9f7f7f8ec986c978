//! Sector classification by deal weight.

use std::fmt;

use serde::Serialize;

use crate::domain::{DealWeight, Fil, TokenAmount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectorKind {
    /// No deal weight of either kind.
    CommittedCapacity,
    /// Verified deal weight only.
    DealBacked,
    /// Unverified deal weight only.
    OrdinaryDeal,
    /// Both weights non-zero. Counted in its own bucket and reported.
    Unclassified,
}

impl SectorKind {
    pub const ALL: [SectorKind; 4] = [
        SectorKind::CommittedCapacity,
        SectorKind::DealBacked,
        SectorKind::OrdinaryDeal,
        SectorKind::Unclassified,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SectorKind::CommittedCapacity => "cc",
            SectorKind::DealBacked => "dc",
            SectorKind::OrdinaryDeal => "od",
            SectorKind::Unclassified => "mixed",
        }
    }
}

impl fmt::Display for SectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

pub fn classify(deal_weight: DealWeight, verified_deal_weight: DealWeight) -> SectorKind {
    match (deal_weight.is_zero(), verified_deal_weight.is_zero()) {
        (true, true) => SectorKind::CommittedCapacity,
        (true, false) => SectorKind::DealBacked,
        (false, true) => SectorKind::OrdinaryDeal,
        (false, false) => SectorKind::Unclassified,
    }
}

/// Raw pledge (base units) to whole tokens, exactly.
pub fn pledge_to_whole(raw: TokenAmount) -> Fil {
    raw.to_fil()
}
