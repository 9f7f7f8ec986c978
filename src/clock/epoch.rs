//! Epoch ↔ wall-clock conversion.
//!
//! The chain produces one epoch every 30 seconds, so the mapping is linear.
//! It is anchored at a calibration point: epoch 1,851,120 is
//! 2022-05-30 00:00:00 in the configured zone.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::clock::Zone;
use crate::domain::ChainEpoch;
use crate::error::AppError;

pub const REFERENCE_EPOCH: ChainEpoch = 1_851_120;
pub const EPOCH_DURATION_SECS: i64 = 30;

/// Accepted by `-d` and used for detail output.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainClock {
    zone: Zone,
    reference: DateTime<Utc>,
}

impl ChainClock {
    pub fn new(zone: Zone) -> Result<Self, AppError> {
        let naive = NaiveDate::from_ymd_opt(2022, 5, 30)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| AppError::format("invalid calibration time"))?;
        let reference = zone
            .from_local(naive)
            .ok_or_else(|| AppError::format(format!("calibration time does not exist in zone {zone}")))?
            .with_timezone(&Utc);
        Ok(Self { zone, reference })
    }

    pub fn epoch_to_timestamp(&self, epoch: ChainEpoch) -> DateTime<FixedOffset> {
        let offset = Duration::seconds((epoch - REFERENCE_EPOCH) * EPOCH_DURATION_SECS);
        self.zone.localize(self.reference + offset)
    }

    /// Calendar day (in the configured zone) on which `epoch` falls.
    pub fn epoch_to_day(&self, epoch: ChainEpoch) -> NaiveDate {
        self.epoch_to_timestamp(epoch).date_naive()
    }

    /// Inverse of [`Self::epoch_to_timestamp`].
    ///
    /// Whole seconds only; the epoch count truncates toward zero, so a time
    /// between two epochs maps to the one closer to the calibration point.
    pub fn timestamp_to_epoch<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> ChainEpoch {
        let secs = at
            .with_timezone(&Utc)
            .signed_duration_since(self.reference)
            .num_seconds();
        secs / EPOCH_DURATION_SECS + REFERENCE_EPOCH
    }

    /// Parse `YYYY-MM-DD HH:MM:SS` as a wall-clock time in the configured zone.
    pub fn parse_datetime(&self, text: &str) -> Result<DateTime<FixedOffset>, AppError> {
        let naive = NaiveDateTime::parse_from_str(text.trim(), DATETIME_FORMAT).map_err(|e| {
            AppError::format(format!(
                "wrong datetime format '{text}' (expected YYYY-MM-DD HH:MM:SS): {e}"
            ))
        })?;
        self.zone
            .from_local(naive)
            .ok_or_else(|| AppError::format(format!("'{text}' does not exist in zone {}", self.zone)))
    }

    pub fn today(&self) -> NaiveDate {
        self.zone.today()
    }
}
