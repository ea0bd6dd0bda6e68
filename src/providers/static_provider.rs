use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use crate::core::currency::Currency;
use crate::core::rates::{RankedRate, RateSource, RateTable, RatesSnapshot, Trend};

const BASE_RATES: [(Currency, Currency, f64); 10] = [
    (Currency::Usdt, Currency::Rub, 92.5),
    (Currency::Usdt, Currency::EurCash, 0.92),
    (Currency::Usdt, Currency::EurCard, 0.91),
    (Currency::Rub, Currency::EurCash, 0.0099),
    (Currency::Rub, Currency::EurCard, 0.0098),
    (Currency::Rub, Currency::Usdt, 0.0108),
    (Currency::EurCash, Currency::Usdt, 1.087),
    (Currency::EurCash, Currency::Rub, 101.2),
    (Currency::EurCard, Currency::Usdt, 1.099),
    (Currency::EurCard, Currency::Rub, 102.1),
];

const NEXT_UPDATE_SECS: u64 = 1800;

/// Serves the built-in base rates. Used with `--offline`.
#[derive(Debug, Clone, Default)]
pub struct StaticRateSource;

impl StaticRateSource {
    pub fn new() -> Self {
        StaticRateSource
    }

    pub fn base_rates() -> RateTable {
        let mut table = RateTable::new();
        for (from, to, rate) in BASE_RATES {
            table.insert(from, to, rate);
        }
        table
    }

    fn top_rates(table: &RateTable) -> Vec<RankedRate> {
        let entry = |from: &str, to: &str, pair: (Currency, Currency), trend: Trend| {
            let change = match trend {
                Trend::Up => 0.3,
                Trend::Down => -0.2,
            };
            RankedRate {
                from: from.to_string(),
                to: to.to_string(),
                rate: table.rate(pair.0, pair.1),
                trend,
                change,
            }
        };

        vec![
            entry("USDT", "RUB", (Currency::Usdt, Currency::Rub), Trend::Up),
            entry(
                "USDT",
                "EUR (нал)",
                (Currency::Usdt, Currency::EurCash),
                Trend::Down,
            ),
            entry(
                "RUB",
                "EUR (безнал)",
                (Currency::Rub, Currency::EurCard),
                Trend::Up,
            ),
            entry(
                "EUR (нал)",
                "RUB",
                (Currency::EurCash, Currency::Rub),
                Trend::Up,
            ),
        ]
    }
}

#[async_trait]
impl RateSource for StaticRateSource {
    async fn fetch_snapshot(&self) -> Result<RatesSnapshot> {
        let rates = Self::base_rates();
        let top_rates = Self::top_rates(&rates);
        Ok(RatesSnapshot {
            rates,
            top_rates,
            updated_at: Utc::now(),
            next_update_secs: NEXT_UPDATE_SECS,
        })
    }
}
