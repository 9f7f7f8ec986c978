//! Big-integer chain quantities.
//!
//! The node encodes token amounts and deal weights as decimal strings because
//! they overflow 64-bit integers. We keep them as exact integers (`i128`/`u128`)
//! and only convert to whole units for display/persistence via [`Fil`], which is
//! exact fixed-point with 18 decimal places. No binary floating point is involved.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Number of base units (attoFIL) per whole token.
pub const ATTO_PER_FIL: u128 = 1_000_000_000_000_000_000;

/// Fractional digits carried by [`Fil`].
pub const FIL_DECIMALS: usize = 18;

/// Parse an unsigned decimal integer without loss.
fn parse_digits(s: &str) -> Option<u128> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.bytes().try_fold(0u128, |acc, b| {
        acc.checked_mul(10)?.checked_add(u128::from(b - b'0'))
    })
}

/// An amount of tokens in base units (1e-18 of a whole token).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenAmount(i128);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);

    pub fn from_atto(atto: i128) -> Self {
        Self(atto)
    }

    pub fn from_whole(whole: i64) -> Self {
        Self(i128::from(whole) * ATTO_PER_FIL as i128)
    }

    pub fn atto(self) -> i128 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Whole-unit value (raw / 1e18), exact.
    pub fn to_fil(self) -> Fil {
        Fil(self.0)
    }
}

impl FromStr for TokenAmount {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let magnitude = parse_digits(digits)
            .and_then(|v| i128::try_from(v).ok())
            .ok_or_else(|| AppError::format(format!("invalid token amount '{s}'")))?;
        Ok(Self(if negative { -magnitude } else { magnitude }))
    }
}

impl TryFrom<String> for TokenAmount {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TokenAmount> for String {
    fn from(value: TokenAmount) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for TokenAmount {
    type Output = TokenAmount;

    fn add(self, rhs: Self) -> Self::Output {
        TokenAmount(self.0 + rhs.0)
    }
}

impl AddAssign for TokenAmount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for TokenAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(TokenAmount::ZERO, Add::add)
    }
}

/// Deal weight (bytes × epochs). Only its zero-ness matters for classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DealWeight(u128);

impl DealWeight {
    pub const ZERO: DealWeight = DealWeight(0);

    pub fn new(value: u128) -> Self {
        Self(value)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl FromStr for DealWeight {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_digits(s.trim())
            .map(DealWeight)
            .ok_or_else(|| AppError::format(format!("invalid deal weight '{s}'")))
    }
}

impl TryFrom<String> for DealWeight {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DealWeight> for String {
    fn from(value: DealWeight) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DealWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whole-token amount with exactly 18 fractional digits.
///
/// `Display` without a precision prints the exact value with trailing zeros
/// trimmed (`"1"`, `"0.5"`). With a precision (`{:.4}`) it rounds half away
/// from zero to that many places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fil(i128);

impl Fil {
    pub const ZERO: Fil = Fil(0);

    pub fn atto(self) -> i128 {
        self.0
    }
}

impl fmt::Display for Fil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        let (magnitude, nonzero) = match f.precision() {
            Some(p) => {
                let p = p.min(FIL_DECIMALS);
                let unit = 10u128.pow((FIL_DECIMALS - p) as u32);
                let rounded = (abs + unit / 2) / unit;
                let scale = 10u128.pow(p as u32);
                let text = if p == 0 {
                    format!("{rounded}")
                } else {
                    format!("{}.{:0width$}", rounded / scale, rounded % scale, width = p)
                };
                (text, rounded != 0)
            }
            None => {
                let whole = abs / ATTO_PER_FIL;
                let frac = abs % ATTO_PER_FIL;
                let text = if frac == 0 {
                    format!("{whole}")
                } else {
                    let digits = format!("{frac:0width$}", width = FIL_DECIMALS);
                    format!("{whole}.{}", digits.trim_end_matches('0'))
                };
                (text, abs != 0)
            }
        };
        if self.0 < 0 && nonzero {
            write!(f, "-{magnitude}")
        } else {
            write!(f, "{magnitude}")
        }
    }
}

impl FromStr for Fil {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::format(format!("invalid token value '{s}'"));
        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if frac.len() > FIL_DECIMALS || (!frac.is_empty() && parse_digits(frac).is_none()) {
            return Err(invalid());
        }
        let whole = parse_digits(whole).ok_or_else(invalid)?;
        let frac_atto = if frac.is_empty() {
            0
        } else {
            parse_digits(frac).ok_or_else(invalid)? * 10u128.pow((FIL_DECIMALS - frac.len()) as u32)
        };
        let atto = whole
            .checked_mul(ATTO_PER_FIL)
            .and_then(|v| v.checked_add(frac_atto))
            .and_then(|v| i128::try_from(v).ok())
            .ok_or_else(invalid)?;
        Ok(Fil(if negative { -atto } else { atto }))
    }
}

impl Add for Fil {
    type Output = Fil;

    fn add(self, rhs: Self) -> Self::Output {
        Fil(self.0 + rhs.0)
    }
}

impl AddAssign for Fil {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Fil {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Fil::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_fil_of_atto_is_exactly_one() {
        let raw: TokenAmount = "1000000000000000000".parse().unwrap();
        assert_eq!(raw.to_fil().to_string(), "1");
        assert_eq!(format!("{:.4}", raw.to_fil()), "1.0000");
    }

    #[test]
    fn large_amounts_keep_every_digit() {
        let raw: TokenAmount = "1000000000000000000000000000001".parse().unwrap();
        assert_eq!(raw.to_fil().to_string(), "1000000000000.000000000000000001");

        let ten_pow_30: TokenAmount = "1000000000000000000000000000000".parse().unwrap();
        assert_eq!(ten_pow_30.to_fil().to_string(), "1000000000000");
    }

    #[test]
    fn precision_rounds_half_away_from_zero() {
        let fil: Fil = "0.00005".parse().unwrap();
        assert_eq!(format!("{fil:.4}"), "0.0001");
        let fil: Fil = "0.00004999".parse().unwrap();
        assert_eq!(format!("{fil:.4}"), "0.0000");
        let fil: Fil = "-2.5".parse().unwrap();
        assert_eq!(format!("{fil:.0}"), "-3");
    }

    #[test]
    fn fil_text_parses_back_exactly() {
        let raw: TokenAmount = "123456789012345678901".parse().unwrap();
        let text = raw.to_fil().to_string();
        assert_eq!(text, "123.456789012345678901");
        let back: Fil = text.parse().unwrap();
        assert_eq!(back, raw.to_fil());
    }

    #[test]
    fn rejects_garbage_and_overflow() {
        assert!("12a".parse::<TokenAmount>().is_err());
        assert!("".parse::<DealWeight>().is_err());
        assert!("-1".parse::<DealWeight>().is_err());
        assert!("1.0000000000000000001".parse::<Fil>().is_err());
        assert!("999999999999999999999999999999999999999999".parse::<TokenAmount>().is_err());
    }

    #[test]
    fn weights_use_numeric_zero_test() {
        assert!("0".parse::<DealWeight>().unwrap().is_zero());
        assert!("000".parse::<DealWeight>().unwrap().is_zero());
        assert!(!"5".parse::<DealWeight>().unwrap().is_zero());
    }

    #[test]
    fn amounts_deserialize_from_json_strings() {
        let amount: TokenAmount = serde_json::from_str("\"2000000000000000000\"").unwrap();
        assert_eq!(amount, TokenAmount::from_whole(2));
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"2000000000000000000\"");
    }
}
