//! Rate tables, snapshots and the rate source abstraction

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use super::currency::Currency;

/// Rate used for any pair the table has no entry for.
pub const IDENTITY_RATE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct CurrencyPair {
    pub from: Currency,
    pub to: Currency,
}

impl CurrencyPair {
    pub fn new(from: Currency, to: Currency) -> Self {
        CurrencyPair { from, to }
    }

    /// Decodes a `FROM-TO` key. Codes may themselves contain `-`, so the
    /// source code is matched as a known prefix rather than split naively.
    pub fn parse_key(key: &str) -> Option<CurrencyPair> {
        Currency::ALL.into_iter().find_map(|from| {
            key.strip_prefix(from.code())
                .and_then(|rest| rest.strip_prefix('-'))
                .and_then(Currency::from_code)
                .map(|to| CurrencyPair::new(from, to))
        })
    }

    pub fn reversed(&self) -> Self {
        CurrencyPair::new(self.to, self.from)
    }
}

impl Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.from.code(), self.to.code())
    }
}

/// Multipliers per ordered currency pair. Neither symmetric nor complete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<CurrencyPair, f64>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: Currency, to: Currency, rate: f64) {
        self.rates.insert(CurrencyPair::new(from, to), rate);
    }

    pub fn get(&self, from: Currency, to: Currency) -> Option<f64> {
        self.rates.get(&CurrencyPair::new(from, to)).copied()
    }

    /// Multiplier for the pair, falling back to [`IDENTITY_RATE`].
    pub fn rate(&self, from: Currency, to: Currency) -> f64 {
        self.get(from, to).unwrap_or(IDENTITY_RATE)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyPair, &f64)> {
        self.rates.iter()
    }
}

impl FromIterator<(CurrencyPair, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (CurrencyPair, f64)>>(iter: I) -> Self {
        RateTable {
            rates: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

impl Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Trend::Up => "up",
                Trend::Down => "down",
            }
        )
    }
}

impl FromStr for Trend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(Trend::Up),
            "down" => Ok(Trend::Down),
            _ => Err(anyhow::anyhow!("Invalid trend: {}", s)),
        }
    }
}

/// Informational entry of the "current rates" list. The endpoints are
/// display labels, not currency codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRate {
    pub from: String,
    pub to: String,
    pub rate: f64,
    pub trend: Trend,
    /// Percent change since the previous update.
    pub change: f64,
}

/// Everything a single fetch returns. Replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq)]
pub struct RatesSnapshot {
    pub rates: RateTable,
    pub top_rates: Vec<RankedRate>,
    pub updated_at: DateTime<Utc>,
    /// Advisory delay until the source expects fresh rates, in seconds.
    pub next_update_secs: u64,
}

impl RatesSnapshot {
    pub fn rate(&self, from: Currency, to: Currency) -> f64 {
        self.rates.rate(from, to)
    }
}

#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<RatesSnapshot>;
}
