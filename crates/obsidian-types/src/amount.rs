//! OBS amounts in atomic units.
//!
//! 1 OBS = 10^8 atomic units. Parsing from decimal text is exact; parsing
//! from floating point rounds to the nearest atomic unit.

use crate::constants::{COIN, DISPLAY_DECIMALS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("amount must not be negative")]
    Negative,

    #[error("amount is not a finite number: {0}")]
    NotANumber(String),

    #[error("amount has more than 8 decimal places")]
    TooPrecise,

    #[error("amount overflows the atomic unit range")]
    Overflow,
}

/// A non-negative amount in atomic units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_atomic(atomic: u64) -> Self {
        Amount(atomic)
    }

    pub const fn atomic(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Convert a floating-point OBS value, as reported by UIs or the node's
    /// `balance_obs` field.
    pub fn from_obs_f64(value: f64) -> Result<Self, AmountError> {
        if !value.is_finite() {
            return Err(AmountError::NotANumber(value.to_string()));
        }
        if value < 0.0 {
            return Err(AmountError::Negative);
        }
        let atomic = (value * COIN as f64).round();
        if atomic >= u64::MAX as f64 {
            return Err(AmountError::Overflow);
        }
        Ok(Amount(atomic as u64))
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parse a decimal OBS string such as `"5"`, `"0.5"` or `"12.00000001"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }
        if s.starts_with('-') {
            return Err(AmountError::Negative);
        }
        let s = s.strip_prefix('+').unwrap_or(s);

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountError::NotANumber(s.to_string()));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(AmountError::NotANumber(s.to_string()));
        }
        if frac.len() > DISPLAY_DECIMALS {
            return Err(AmountError::TooPrecise);
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| AmountError::Overflow)?
        };
        let mut frac_units: u64 = 0;
        if !frac.is_empty() {
            let padded = format!("{:0<width$}", frac, width = DISPLAY_DECIMALS);
            frac_units = padded.parse().map_err(|_| AmountError::NotANumber(s.to_string()))?;
        }

        whole
            .checked_mul(COIN)
            .and_then(|w| w.checked_add(frac_units))
            .map(Amount)
            .ok_or(AmountError::Overflow)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:0width$}",
            self.0 / COIN,
            self.0 % COIN,
            width = DISPLAY_DECIMALS
        )
    }
}
