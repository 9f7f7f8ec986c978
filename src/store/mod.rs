//! SQLite persistence for clusters and daily sector summaries.
//!
//! Only this module talks to the database.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::error::AppError;
use crate::sectors::{DailyAggregate, KindTotals, SectorAggregation};

pub mod dsn;

pub use dsn::*;

const SCHEMA: &str = include_str!("schema.sql");

const DELETE_SUMMARY_SQL: &str =
    "DELETE FROM filecoin_cluster_sector_expiration WHERE miner = ?1 AND update_date = ?2";

const INSERT_SUMMARY_SQL: &str = "INSERT INTO filecoin_cluster_sector_expiration
     (name, miner, date, cc_count, cc_pledge, dc_count, dc_pledge, od_count, od_pledge,
      unclassified_count, unclassified_pledge, update_date)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

/// A cluster name and the miner actor it operates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterRecord {
    pub name: String,
    pub miner: String,
}

/// One stored per-day row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub name: String,
    pub miner: String,
    pub date: NaiveDate,
    pub totals: DailyAggregate,
    pub update_date: String,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database at `dsn` and ensure the tables exist.
    pub fn open(dsn: &str) -> Result<Self, AppError> {
        let conn = Connection::open(dsn)
            .map_err(|e| AppError::connection(format!("connect to store '{dsn}' failed: {e}")))?;
        let store = Self { conn };
        store.ensure_tables()?;
        Ok(store)
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> Result<Self, AppError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.ensure_tables()?;
        Ok(store)
    }

    fn ensure_tables(&self) -> Result<(), AppError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ── Clusters ───────────────────────────────────────────────

    pub fn upsert_cluster(&self, name: &str, miner: &str) -> Result<(), AppError> {
        self.conn.execute(
            "INSERT INTO cluster_list (name, f0) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET f0 = excluded.f0",
            params![name, miner],
        )?;
        Ok(())
    }

    pub fn lookup_miner_by_cluster(&self, name: &str) -> Result<String, AppError> {
        self.conn
            .query_row("SELECT f0 FROM cluster_list WHERE name = ?1", params![name], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| AppError::lookup(format!("cluster '{name}' not found")))
    }

    pub fn list_clusters(&self) -> Result<Vec<ClusterRecord>, AppError> {
        let mut stmt = self.conn.prepare("SELECT name, f0 FROM cluster_list ORDER BY name ASC")?;
        let clusters = stmt
            .query_map([], |row| {
                Ok(ClusterRecord {
                    name: row.get(0)?,
                    miner: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(clusters)
    }

    // ── Daily summaries ────────────────────────────────────────

    /// Replace every row for `(miner, update_date)` with one row per day bucket.
    ///
    /// Runs in a single transaction; on any error nothing is changed. Returns
    /// the number of rows inserted.
    pub fn replace_daily_summary(
        &mut self,
        cluster: &ClusterRecord,
        update_date: &str,
        aggregation: &SectorAggregation,
    ) -> Result<usize, AppError> {
        let tx = self.conn.transaction()?;

        let deleted = tx
            .execute(DELETE_SUMMARY_SQL, params![cluster.miner, update_date])
            .map_err(|e| statement_error(DELETE_SUMMARY_SQL, &[cluster.miner.as_str(), update_date], e))?;
        debug!(cluster = %cluster.name, miner = %cluster.miner, deleted, "cleared previous summary");

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(INSERT_SUMMARY_SQL)?;
            for (day, bucket) in aggregation.days() {
                let date = day.to_string();
                let cc = bucket.committed_capacity;
                let dc = bucket.deal_backed;
                let od = bucket.ordinary_deal;
                let mixed = bucket.unclassified;
                stmt.execute(params![
                    cluster.name,
                    cluster.miner,
                    date,
                    cc.count as i64,
                    cc.pledge.to_string(),
                    dc.count as i64,
                    dc.pledge.to_string(),
                    od.count as i64,
                    od.pledge.to_string(),
                    mixed.count as i64,
                    mixed.pledge.to_string(),
                    update_date,
                ])
                .map_err(|e| {
                    statement_error(
                        INSERT_SUMMARY_SQL,
                        &[cluster.name.as_str(), cluster.miner.as_str(), date.as_str(), update_date],
                        e,
                    )
                })?;
                inserted += 1;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    pub fn daily_summary(&self, miner: &str, update_date: &str) -> Result<Vec<SummaryRow>, AppError> {
        let mut stmt = self.conn.prepare(
            "SELECT name, miner, date, cc_count, cc_pledge, dc_count, dc_pledge, od_count, od_pledge,
                    unclassified_count, unclassified_pledge, update_date
             FROM filecoin_cluster_sector_expiration
             WHERE miner = ?1 AND update_date = ?2
             ORDER BY date ASC",
        )?;
        let raw = stmt
            .query_map(params![miner, update_date], |row| {
                Ok(RawSummaryRow {
                    name: row.get(0)?,
                    miner: row.get(1)?,
                    date: row.get(2)?,
                    counts: [row.get(3)?, row.get(5)?, row.get(7)?, row.get(9)?],
                    pledges: [row.get(4)?, row.get(6)?, row.get(8)?, row.get(10)?],
                    update_date: row.get(11)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter().map(RawSummaryRow::decode).collect()
    }

    /// Make every summary insert for cluster `name` abort.
    #[cfg(test)]
    pub(crate) fn reject_inserts_for(&self, name: &str) -> Result<(), AppError> {
        let name = name.replace('\'', "''");
        self.conn.execute_batch(&format!(
            "CREATE TRIGGER IF NOT EXISTS reject_inserts BEFORE INSERT ON filecoin_cluster_sector_expiration
             WHEN NEW.name = '{name}'
             BEGIN SELECT RAISE(ABORT, 'read only'); END;"
        ))?;
        Ok(())
    }
}

struct RawSummaryRow {
    name: String,
    miner: String,
    date: String,
    counts: [i64; 4],
    pledges: [String; 4],
    update_date: String,
}

impl RawSummaryRow {
    fn decode(self) -> Result<SummaryRow, AppError> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|e| AppError::format(format!("stored date '{}' is invalid: {e}", self.date)))?;
        let totals = |i: usize| -> Result<KindTotals, AppError> {
            Ok(KindTotals {
                count: self.counts[i].max(0) as u64,
                pledge: self.pledges[i].parse()?,
            })
        };
        Ok(SummaryRow {
            totals: DailyAggregate {
                committed_capacity: totals(0)?,
                deal_backed: totals(1)?,
                ordinary_deal: totals(2)?,
                unclassified: totals(3)?,
            },
            name: self.name,
            miner: self.miner,
            date,
            update_date: self.update_date,
        })
    }
}

fn statement_error(sql: &str, args: &[&str], err: rusqlite::Error) -> AppError {
    let compact = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    AppError::persistence(format!("sql exec failed, sql: {compact} {args:?}, err: {err}"))
}
