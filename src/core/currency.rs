//! The closed set of currencies the calculator trades in.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum Currency {
    Usdt,
    Rub,
    EurCash,
    EurCard,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown currency code: {0}")]
pub struct UnknownCurrency(pub String);

impl Currency {
    /// Every supported currency, in display order.
    pub const ALL: [Currency; 4] = [
        Currency::Usdt,
        Currency::Rub,
        Currency::EurCash,
        Currency::EurCard,
    ];

    /// Code used on the wire and in rate table keys.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usdt => "USDT",
            Currency::Rub => "RUB",
            Currency::EurCash => "EUR-CASH",
            Currency::EurCard => "EUR-CARD",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Currency::Usdt => "USDT",
            Currency::Rub => "Рубль",
            Currency::EurCash => "Евро (наличные)",
            Currency::EurCard => "Евро (безнал)",
        }
    }

    /// Icon identifier, consumed by the presentation layer only.
    pub fn icon(&self) -> &'static str {
        match self {
            Currency::Usdt => "Bitcoin",
            Currency::Rub => "Coins",
            Currency::EurCash => "Banknote",
            Currency::EurCard => "CreditCard",
        }
    }

    /// Looks up a currency by its exact wire code.
    pub fn from_code(code: &str) -> Option<Currency> {
        Currency::ALL.into_iter().find(|c| c.code() == code)
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('_', "-");
        Currency::from_code(&normalized).ok_or_else(|| UnknownCurrency(s.to_string()))
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}
