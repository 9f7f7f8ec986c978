//! `sector-daily`: refresh today's stored summary for every cluster.

use chrono::NaiveDate;
use clap::Parser;
use tracing::{error, info, warn};

use crate::app::load_env;
use crate::chain::{ChainApi, LotusClient};
use crate::cli::DailyCli;
use crate::clock::{ChainClock, DATE_FORMAT};
use crate::domain::{Address, TipSetKey};
use crate::error::{AppError, ErrorKind};
use crate::sectors::aggregate;
use crate::store::{ClusterRecord, Store};

/// Outcome of one batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: Vec<String>,
    /// Cluster name and the reason it was skipped.
    pub failed: Vec<(String, String)>,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Entry point for the `sector-daily` binary.
pub fn run() -> Result<(), AppError> {
    load_env();
    let cli = DailyCli::parse();
    let clock = ChainClock::new(cli.zone)?;

    let chain = LotusClient::connect(&cli.lotus_api, cli.token.as_deref())
        .map_err(|e| e.context("connect to lotus api failed"))?;
    info!(endpoint = chain.endpoint(), "lotus api client ready");

    let mut store = Store::open(&cli.dsn).map_err(|e| e.context("init db failed"))?;
    info!("db init success");

    let summary = run_batch(&chain, &mut store, &clock, &update_date(clock.today()))?;
    if summary.all_succeeded() {
        Ok(())
    } else {
        Err(AppError::exit(1))
    }
}

/// `YYYY-MM-DD 00:00:00` for the given day.
pub fn update_date(day: NaiveDate) -> String {
    format!("{} 00:00:00", day.format(DATE_FORMAT))
}

/// Recompute and store the summary of every cluster, in name order.
///
/// A failure for one cluster is logged and the loop moves on. Losing the
/// node is fatal and aborts the run.
pub fn run_batch<C: ChainApi>(
    chain: &C,
    store: &mut Store,
    clock: &ChainClock,
    update_date: &str,
) -> Result<BatchSummary, AppError> {
    let clusters = store
        .list_clusters()
        .map_err(|e| e.context("get cluster info failed"))?;
    info!(count = clusters.len(), "get cluster info success");

    let summary = clusters
        .iter()
        .try_fold(BatchSummary::default(), |mut summary, cluster| {
            match refresh_cluster(chain, store, clock, cluster, update_date) {
                Ok(rows) => {
                    info!(cluster = %cluster.name, miner = %cluster.miner, rows, "summary replaced");
                    summary.succeeded.push(cluster.name.clone());
                }
                Err(err) if err.kind() == ErrorKind::Connection => return Err(err),
                Err(err) => {
                    warn!(cluster = %cluster.name, miner = %cluster.miner, "skipping cluster: {err}");
                    summary.failed.push((cluster.name.clone(), err.to_string()));
                }
            }
            Ok(summary)
        })?;

    info!(
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        update_date,
        "daily summary finished"
    );
    for (name, reason) in &summary.failed {
        error!(cluster = %name, "{reason}");
    }
    Ok(summary)
}

fn refresh_cluster<C: ChainApi>(
    chain: &C,
    store: &mut Store,
    clock: &ChainClock,
    cluster: &ClusterRecord,
    update_date: &str,
) -> Result<usize, AppError> {
    let miner: Address = cluster
        .miner
        .parse()
        .map_err(|e: AppError| e.context("convert to address failed"))?;
    let sectors = chain.state_miner_active_sectors(&miner, &TipSetKey::default())?;
    let aggregation = aggregate(&sectors, clock);
    store.replace_daily_summary(cluster, update_date, &aggregation)
}
