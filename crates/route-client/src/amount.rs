//! Exact conversion between human decimal amounts and integer base units.
//!
//! Scaling is done on the digit string, never through floating point, so 18-decimal tokens keep
//! every digit.

use log::warn;
use ruint::aliases::U256;
use thiserror::Error;

const ADDRESS_MIN_LENGTH: usize = 12;
const MISSING_ADDRESS: &str = "N/A";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Invalid amount {0:?}: expected a non-negative decimal number")]
    InvalidAmount(String),

    #[error("Amount {0:?} does not fit in 256 bits at {1} decimals")]
    Overflow(String, u8),
}

/// Converts a decimal numeral such as `"100"`, `"0.1"` or `".5"` into base units.
///
/// Fractional digits beyond `decimals` are rounded half away from zero.
pub fn to_base_units(human_amount: &str, decimals: u8) -> Result<String, AmountError> {
    parse_human_amount(human_amount, decimals).map(|amount| amount.to_string())
}

pub fn parse_human_amount(human_amount: &str, decimals: u8) -> Result<U256, AmountError> {
    let trimmed = human_amount.trim();
    let invalid = || AmountError::InvalidAmount(human_amount.to_string());

    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let decimals_len = decimals as usize;
    let (kept, dropped) = if fraction.len() > decimals_len {
        fraction.split_at(decimals_len)
    } else {
        (fraction, "")
    };

    let mut digits = String::with_capacity(whole.len() + decimals_len + 1);
    digits.push('0');
    digits.push_str(whole);
    digits.push_str(kept);
    for _ in kept.len()..decimals_len {
        digits.push('0');
    }

    let overflow = || AmountError::Overflow(human_amount.to_string(), decimals);
    let scaled = U256::from_str_radix(&digits, 10).map_err(|_| overflow())?;

    let round_up = dropped.bytes().next().is_some_and(|digit| digit >= b'5');
    if round_up {
        scaled.checked_add(U256::from(1u8)).ok_or_else(overflow)
    } else {
        Ok(scaled)
    }
}

/// Parses an unsigned integer base-unit string.
pub fn parse_base_units(base_units: &str) -> Result<U256, AmountError> {
    let trimmed = base_units.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(AmountError::InvalidAmount(base_units.to_string()));
    }
    U256::from_str_radix(trimmed, 10).map_err(|_| AmountError::Overflow(base_units.to_string(), 0))
}

/// Renders base units as a decimal string, truncating (never rounding) to `display_decimals`.
///
/// Empty or zero input renders as `"0"`. Input that is not an unsigned integer is returned as is.
pub fn to_human_units(base_units: &str, decimals: u8, display_decimals: u8) -> String {
    if base_units.trim().is_empty() {
        return "0".to_string();
    }

    let value = match parse_base_units(base_units) {
        Ok(value) => value,
        Err(err) => {
            warn!("Cannot format base units: {}", err);
            return base_units.to_string();
        }
    };
    if value.is_zero() {
        return "0".to_string();
    }

    let Some(divisor) = U256::from(10u8).checked_pow(U256::from(decimals)) else {
        warn!("Cannot format base units {} at {} decimals", base_units, decimals);
        return base_units.to_string();
    };
    let (whole, remainder) = value.div_rem(divisor);

    let shown = display_decimals.min(decimals) as usize;
    if shown == 0 {
        return whole.to_string();
    }

    let fraction = format!("{:0>width$}", remainder.to_string(), width = decimals as usize);
    format!("{}.{}", whole, &fraction[..shown])
}

/// Shortens an address to `0xA0b8...eB48` for display. Not a validity check.
pub fn format_address(address: Option<&str>) -> String {
    let address = match address {
        Some(address) if !address.is_empty() => address,
        _ => return MISSING_ADDRESS.to_string(),
    };

    let chars: Vec<char> = address.chars().collect();
    if chars.len() < ADDRESS_MIN_LENGTH {
        return address.to_string();
    }

    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
