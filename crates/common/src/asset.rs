//! Asset amount arithmetic on `"<decimal> <symbol>"` strings

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Decimal places kept after adding or subtracting amounts
pub const AMOUNT_PRECISION: i32 = 4;

/// An amount of a token, e.g. `10.0000 SYS`
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub amount: f64,
    pub symbol: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid asset string: {0}")]
pub struct ParseAssetError(String);

impl FromStr for Asset {
    type Err = ParseAssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(amount), Some(symbol), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ParseAssetError(s.to_string()));
        };
        let amount = amount
            .parse::<f64>()
            .map_err(|_| ParseAssetError(s.to_string()))?;
        Ok(Asset {
            amount,
            symbol: symbol.to_string(),
        })
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug formatting keeps a fractional part on whole numbers ("11.0")
        write!(f, "{:?} {}", self.amount, self.symbol)
    }
}

impl Asset {
    pub fn checked_add(&self, delta: &Asset) -> Option<Asset> {
        self.combine(delta, self.amount + delta.amount)
    }

    pub fn checked_sub(&self, delta: &Asset) -> Option<Asset> {
        self.combine(delta, self.amount - delta.amount)
    }

    fn combine(&self, delta: &Asset, amount: f64) -> Option<Asset> {
        if self.symbol != delta.symbol {
            return None;
        }
        Some(Asset {
            amount: round_to(amount, AMOUNT_PRECISION),
            symbol: self.symbol.clone(),
        })
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    let rounded = (value * scale).round() / scale;
    // avoid rendering "-0.0" when a subtraction cancels out
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Add `delta` to `asset`; `None` on malformed input or symbol mismatch
pub fn add_amount(asset: &str, delta: &str) -> Option<String> {
    let asset: Asset = asset.parse().ok()?;
    let delta: Asset = delta.parse().ok()?;
    asset.checked_add(&delta).map(|sum| sum.to_string())
}

/// Subtract `delta` from `asset`; `None` on malformed input or symbol mismatch
pub fn deduct_amount(asset: &str, delta: &str) -> Option<String> {
    let asset: Asset = asset.parse().ok()?;
    let delta: Asset = delta.parse().ok()?;
    asset.checked_sub(&delta).map(|rest| rest.to_string())
}
