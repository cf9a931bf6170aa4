//! Exact conversion between user-entered decimal amounts and base units.
//!
//! One display unit is `10^18` base units. Amounts are validated as plain decimal strings and
//! scaled with checked `U256` arithmetic, so no floating point is ever involved and overflow is
//! reported instead of wrapping.

use alloy_primitives::{
    U256,
    utils::{Unit, format_ether},
};

/// Number of fractional digits of the display unit.
pub const DECIMALS: usize = 18;

/// Why an amount string was rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount must not be negative")]
    Negative,
    #[error("unexpected character {0:?}")]
    InvalidCharacter(char),
    #[error("amount has more than one decimal point")]
    MultipleDecimalPoints,
    #[error("amount has no digits")]
    NoDigits,
    #[error("at most {DECIMALS} fractional digits are supported, got {0}")]
    TooPrecise(usize),
    #[error("amount does not fit in 256 bits")]
    Overflow,
}

/// Parses a non-negative decimal amount of display units into base units.
///
/// Accepts `1`, `1.5`, `.5` and `5.`; surrounding whitespace is ignored.
pub fn parse_amount(input: &str) -> Result<U256, AmountError> {
    let amount = input.trim();
    if amount.is_empty() {
        return Err(AmountError::Empty);
    }
    if amount.starts_with('-') {
        return Err(AmountError::Negative);
    }

    let (int, frac) = amount.split_once('.').unwrap_or((amount, ""));
    if frac.contains('.') {
        return Err(AmountError::MultipleDecimalPoints);
    }
    if let Some(c) = int.chars().chain(frac.chars()).find(|c| !c.is_ascii_digit()) {
        return Err(AmountError::InvalidCharacter(c));
    }
    if int.is_empty() && frac.is_empty() {
        return Err(AmountError::NoDigits);
    }
    if frac.len() > DECIMALS {
        return Err(AmountError::TooPrecise(frac.len()));
    }

    let whole = parse_digits(int)?;
    let fraction = parse_digits(&format!("{frac:0<DECIMALS$}"))?;
    whole
        .checked_mul(Unit::ETHER.wei())
        .and_then(|scaled| scaled.checked_add(fraction))
        .ok_or(AmountError::Overflow)
}

fn parse_digits(digits: &str) -> Result<U256, AmountError> {
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10).map_err(|_| AmountError::Overflow)
}

/// Formats base units as a display amount without trailing zeros.
pub fn format_amount(value: U256) -> String {
    let formatted = format_ether(value);
    match formatted.split_once('.') {
        Some((int, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() { int.to_string() } else { format!("{int}.{frac}") }
        }
        None => formatted,
    }
}
