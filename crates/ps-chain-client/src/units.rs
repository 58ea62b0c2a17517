//! Conversions between human decimal amounts and the contracts'
//! smallest-unit integers (18 decimals for both ether and the reward token).

use alloy_primitives::U256;
use alloy_primitives::utils::parse_ether;
use anyhow::{Result, anyhow};

const SMALLEST_UNITS_PER_WHOLE: f64 = 1e18;

/// `"0.01"` → `10_000_000_000_000_000`.
pub fn parse_amount(decimal: &str) -> Result<U256> {
    let decimal = decimal.trim();
    if decimal.is_empty() {
        return Err(anyhow!("amount is required"));
    }
    if decimal.starts_with('-') {
        return Err(anyhow!("amount cannot be negative: {decimal}"));
    }

    parse_ether(decimal).map_err(|err| anyhow!("invalid amount '{decimal}': {err}"))
}

/// Display value of a smallest-unit integer, rounded to the nearest `f64`.
pub fn to_display_amount(value: U256) -> f64 {
    f64::from(value) / SMALLEST_UNITS_PER_WHOLE
}

pub fn to_u64(value: U256) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("value {value} does not fit in u64"))
}
