//! The timezone used to render epochs as calendar dates.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

use crate::error::AppError;

/// Either the process-local zone or a fixed UTC offset.
///
/// `Local` follows the host's zone rules (including DST); a fixed offset makes
/// output reproducible across machines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Zone {
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl Zone {
    pub fn utc() -> Self {
        Zone::Fixed(Utc.fix())
    }

    /// Interpret a wall-clock time in this zone.
    ///
    /// Ambiguous times (DST fold) resolve to the earlier instant; times that
    /// do not exist (DST gap) yield `None`.
    pub fn from_local(&self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            Zone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
            Zone::Fixed(offset) => offset.from_local_datetime(&naive).earliest(),
        }
    }

    /// Render an instant in this zone.
    pub fn localize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Zone::Local => instant.with_timezone(&Local).fixed_offset(),
            Zone::Fixed(offset) => instant.with_timezone(offset),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.localize(Utc::now()).date_naive()
    }
}

impl FromStr for Zone {
    type Err = AppError;

    /// Accepts `local`, `utc`/`z`, or an offset like `+08:00`, `-0530`, `+8`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "local" => return Ok(Zone::Local),
            "utc" | "z" => return Ok(Zone::utc()),
            _ => {}
        }

        let invalid = || AppError::format(format!("invalid timezone '{s}': expected local, utc or ±HH:MM"));
        let (sign, rest) = match trimmed.as_bytes().first() {
            Some(b'+') => (1, &trimmed[1..]),
            Some(b'-') => (-1, &trimmed[1..]),
            _ => return Err(invalid()),
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if digits.is_empty() || digits.len() > 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let (hours, minutes) = if digits.len() <= 2 {
            (digits.as_str(), "0")
        } else {
            digits.split_at(digits.len() - 2)
        };
        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if hours > 23 || minutes > 59 {
            return Err(invalid());
        }
        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Zone::Fixed)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Local => write!(f, "local"),
            Zone::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offsets_and_names() {
        assert_eq!("local".parse::<Zone>().unwrap(), Zone::Local);
        assert_eq!("UTC".parse::<Zone>().unwrap(), Zone::utc());
        assert_eq!(
            "+08:00".parse::<Zone>().unwrap(),
            Zone::Fixed(FixedOffset::east_opt(8 * 3600).unwrap())
        );
        assert_eq!(
            "-0530".parse::<Zone>().unwrap(),
            Zone::Fixed(FixedOffset::east_opt(-(5 * 3600 + 30 * 60)).unwrap())
        );
        assert_eq!(
            "+8".parse::<Zone>().unwrap(),
            Zone::Fixed(FixedOffset::east_opt(8 * 3600).unwrap())
        );
    }

    #[test]
    fn rejects_bad_offsets() {
        for bad in ["", "08:00", "+25:00", "+08:61", "Asia/Shanghai", "+123456"] {
            assert!(bad.parse::<Zone>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn fixed_zone_localizes_instants() {
        let zone: Zone = "+08:00".parse().unwrap();
        let instant = Utc.with_ymd_and_hms(2022, 5, 29, 16, 0, 0).unwrap();
        assert_eq!(zone.localize(instant).to_rfc3339(), "2022-05-30T00:00:00+08:00");
    }
}
