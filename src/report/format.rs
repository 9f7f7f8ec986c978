//! Formatted terminal output for the interactive report.
//!
//! Formatting lives here so the aggregation code stays free of presentation
//! and output changes are localized.

use chrono::NaiveDate;

use crate::clock::{ChainClock, DATETIME_FORMAT};
use crate::sectors::{DailyAggregate, KindTotals, SectorAggregation, SectorDetail, SectorKind};

const OVERVIEW_BANNER: &str = "============== cluster overview ===============";

fn kinds_to_show(agg: &SectorAggregation) -> Vec<SectorKind> {
    let mut kinds = vec![
        SectorKind::CommittedCapacity,
        SectorKind::DealBacked,
        SectorKind::OrdinaryDeal,
    ];
    // The mixed column only appears when such sectors exist.
    if agg.totals().unclassified.count > 0 {
        kinds.push(SectorKind::Unclassified);
    }
    kinds
}

fn fmt_totals(label: &str, totals: KindTotals) -> String {
    format!("{label} sectors {}, pledge: {:.4} FIL", totals.count, totals.pledge)
}

/// One line for a single expiration day.
pub fn format_day_line(day: &NaiveDate, bucket: &DailyAggregate, kinds: &[SectorKind]) -> String {
    let parts: Vec<String> = kinds
        .iter()
        .map(|kind| fmt_totals(kind.label(), bucket.get(*kind)))
        .collect();
    format!("{day}: {}\t {}", parts.join(", "), fmt_totals("total", bucket.total()))
}

/// Per-day lines in ascending date order.
pub fn format_daily_lines(agg: &SectorAggregation) -> String {
    let kinds = kinds_to_show(agg);
    let mut out = String::new();
    for (day, bucket) in agg.days() {
        out.push_str(&format_day_line(day, bucket, &kinds));
        out.push('\n');
    }
    out
}

/// Global totals across all days.
pub fn format_overview(agg: &SectorAggregation) -> String {
    let totals = agg.totals();
    let mut out = String::new();
    out.push_str(OVERVIEW_BANNER);
    out.push('\n');

    // Overview lists od before dc.
    let mut kinds = vec![
        SectorKind::CommittedCapacity,
        SectorKind::OrdinaryDeal,
        SectorKind::DealBacked,
    ];
    if totals.unclassified.count > 0 {
        kinds.push(SectorKind::Unclassified);
    }
    for kind in kinds {
        let t = totals.get(kind);
        out.push_str(&format!(
            "{:<5} sectors \t{}, pledge: {:.4} FIL\n",
            kind.label(),
            t.count,
            t.pledge
        ));
    }
    let total = totals.total();
    out.push_str(&format!(
        "total sectors \t{}, pledge: {:.4} FIL\n",
        total.count, total.pledge
    ));
    out
}

/// One line of `-v` output for a sector.
pub fn format_sector_detail(detail: &SectorDetail, clock: &ChainClock) -> String {
    let s = &detail.sector;
    format!(
        "type:{},sector:{},Activation:{},date:{},expandable:{},Expiration:{},date:{},DealWeight:{},VerifiedDealWeight:{},InitialPledge:{},dealid:{:?},DealStartEpoch:{:?}",
        detail.kind,
        s.sector_number,
        s.activation,
        clock.epoch_to_timestamp(s.activation).format(DATETIME_FORMAT),
        detail.expandable,
        s.expiration,
        clock.epoch_to_timestamp(s.expiration).format(DATETIME_FORMAT),
        s.deal_weight,
        s.verified_deal_weight,
        s.initial_pledge.to_fil(),
        s.deal_ids,
        detail.deal_start_epochs,
    )
}
