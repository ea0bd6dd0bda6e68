//! Amount parsing and rate-table-driven conversion.
//!
//! Everything here is pure and cheap enough to be recomputed on every render.

use rust_decimal::prelude::*;
use std::fmt::Display;
use thiserror::Error;

use super::currency::Currency;
use super::rates::{IDENTITY_RATE, RatesSnapshot};

/// Decimal places shown for converted amounts.
pub const AMOUNT_PRECISION: u32 = 2;
/// Decimal places shown for the rate line.
pub const RATE_PRECISION: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidAmount {
    #[error("Amount is empty")]
    Empty,
    #[error("Amount is not a number: {0}")]
    NotANumber(String),
    #[error("Amount must not be negative: {0}")]
    Negative(String),
    #[error("Amount is too large to display: {0}")]
    OutOfRange(String),
}

/// Parses free-text amount input. Accepts `,` as the decimal separator.
pub fn parse_amount(text: &str) -> Result<f64, InvalidAmount> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InvalidAmount::Empty);
    }

    let amount: f64 = trimmed
        .replace(',', ".")
        .parse()
        .map_err(|_| InvalidAmount::NotANumber(trimmed.to_string()))?;

    // "NaN" and "inf" parse fine as f64
    if !amount.is_finite() {
        return Err(InvalidAmount::NotANumber(trimmed.to_string()));
    }
    if amount < 0.0 {
        return Err(InvalidAmount::Negative(trimmed.to_string()));
    }

    // Drop the sign of -0
    Ok(if amount == 0.0 { 0.0 } else { amount })
}

/// Rounds half away from zero to [`AMOUNT_PRECISION`] places.
pub fn round_amount(value: f64) -> Option<Decimal> {
    let mut rounded = Decimal::from_f64(value)?
        .round_dp_with_strategy(AMOUNT_PRECISION, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(AMOUNT_PRECISION);
    Some(rounded)
}

/// Result of converting an amount between two currencies.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub from: Currency,
    pub to: Currency,
    pub amount: f64,
    pub rate: f64,
    pub converted: Decimal,
}

impl Conversion {
    pub fn value(&self) -> f64 {
        self.converted.to_f64().unwrap_or_default()
    }
}

impl Display for Conversion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.converted)
    }
}

fn lookup_rate(from: Currency, to: Currency, snapshot: Option<&RatesSnapshot>) -> f64 {
    snapshot.map_or(IDENTITY_RATE, |s| s.rate(from, to))
}

/// Converts `amount_text` from one currency to another using the snapshot's
/// rate table. Missing pairs, and a missing snapshot, use the identity rate.
pub fn convert(
    from: Currency,
    to: Currency,
    amount_text: &str,
    snapshot: Option<&RatesSnapshot>,
) -> Result<Conversion, InvalidAmount> {
    let amount = parse_amount(amount_text)?;
    let rate = lookup_rate(from, to, snapshot);
    let converted = round_amount(amount * rate)
        .ok_or_else(|| InvalidAmount::OutOfRange(amount_text.trim().to_string()))?;

    Ok(Conversion {
        from,
        to,
        amount,
        rate,
        converted,
    })
}

/// Human readable rate, e.g. `1 USDT = 92.5000 RUB`.
pub fn rate_line(from: Currency, to: Currency, snapshot: Option<&RatesSnapshot>) -> String {
    let rate = lookup_rate(from, to, snapshot);
    format!("1 {from} = {rate:.prec$} {to}", prec = RATE_PRECISION)
}
