//! Integer-scaled decimal math (base-10^decimals), safe conversions.
//!
//! Token values on-chain span 10^-18..10^12 in human units; `f64` cannot
//! represent that range losslessly, and profit arithmetic built on floats
//! quietly corrupts PnL at the margins that matter most. Every amount that
//! crosses an adapter boundary is instead carried as a `U256` integer in
//! base units, and converted to/from decimal only at the edges — alongside
//! alloy's native integer type rather than `rust_decimal`, whose ~28-digit
//! mantissa falls short of the precision the original implementation
//! enforced (`getcontext().prec = 60` in the Python it was ported from).
//!
//! Author: AI-Generated
//! Created: 2026-02-14

use alloy::primitives::U256;
use std::fmt;

/// Maximum `decimals` this module will scale by. alloy tokens are never
/// deployed above 30 decimals in practice.
pub const MAX_DECIMALS: u32 = 30;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FixedPointError {
    #[error("decimals {0} exceeds maximum supported {MAX_DECIMALS}")]
    DecimalsOutOfRange(u32),
    #[error("malformed decimal literal: {0:?}")]
    MalformedDecimal(String),
    #[error("amount overflows U256 at the requested scale")]
    Overflow,
}

/// Convert a decimal amount (given as its canonical string form, e.g.
/// `"1000.5"` or `"-0.003"`) into an integer count of base units, truncating
/// toward zero. Negative amounts are rejected — every quantity that crosses
/// an adapter boundary is a non-negative balance or quote amount.
pub fn to_base(amount_decimal: &str, decimals: u8) -> Result<U256, FixedPointError> {
    if decimals as u32 > MAX_DECIMALS {
        return Err(FixedPointError::DecimalsOutOfRange(decimals as u32));
    }
    let amount_decimal = amount_decimal.trim();
    if amount_decimal.starts_with('-') {
        return Err(FixedPointError::MalformedDecimal(amount_decimal.to_string()));
    }

    let (int_part, frac_part) = match amount_decimal.split_once('.') {
        Some((i, f)) => (i, f),
        None => (amount_decimal, ""),
    };
    let int_part = if int_part.is_empty() { "0" } else { int_part };

    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(FixedPointError::MalformedDecimal(amount_decimal.to_string()));
    }

    let decimals = decimals as usize;
    // Truncate toward zero: keep at most `decimals` fractional digits, drop the rest.
    let mut frac_digits = frac_part.to_string();
    if frac_digits.len() > decimals {
        frac_digits.truncate(decimals);
    } else {
        frac_digits.push_str(&"0".repeat(decimals - frac_digits.len()));
    }

    let combined = format!("{int_part}{frac_digits}");
    let combined = combined.trim_start_matches('0');
    let combined = if combined.is_empty() { "0" } else { combined };

    U256::from_str_radix(combined, 10).map_err(|_| FixedPointError::Overflow)
}

/// Convert an integer count of base units back into its exact decimal
/// string representation. This is exact (no rounding): the integer carries
/// every significant digit, so the only work is placing the decimal point.
pub fn from_base(amount_integer: U256, decimals: u8) -> String {
    if decimals == 0 {
        return amount_integer.to_string();
    }
    let decimals = decimals as usize;
    let digits = amount_integer.to_string();
    if digits.len() <= decimals {
        let padded = format!("{}{}", "0".repeat(decimals - digits.len() + 1), digits);
        let split = padded.len() - decimals;
        format!("{}.{}", &padded[..split], &padded[split..])
    } else {
        let split = digits.len() - decimals;
        format!("{}.{}", &digits[..split], &digits[split..])
    }
}

/// Truncate a decimal string to `decimals` fractional digits without
/// rescaling, matching the truncation semantics of a fixed-precision
/// decimal context rather than binary-float rounding.
pub fn truncate(amount_decimal: &str, decimals: u8) -> String {
    let base = to_base(amount_decimal, decimals).unwrap_or(U256::ZERO);
    from_base(base, decimals)
}

/// A convenience wrapper used where call sites want arithmetic on raw
/// amounts without re-parsing strings everywhere. Equality/ordering are
/// exact since both are just `U256` wrappers around truthful base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BaseAmount {
    pub raw: U256,
    pub decimals: u8,
}

impl BaseAmount {
    pub fn from_decimal(amount_decimal: &str, decimals: u8) -> Result<Self, FixedPointError> {
        Ok(Self {
            raw: to_base(amount_decimal, decimals)?,
            decimals,
        })
    }

    pub fn to_decimal_string(&self) -> String {
        from_base(self.raw, self.decimals)
    }
}

impl fmt::Display for BaseAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal_string())
    }
}
