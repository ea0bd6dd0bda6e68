//! Core business logic: currencies, rates, conversion and the view lifecycle

pub mod config;
pub mod convert;
pub mod currency;
pub mod log;
pub mod poller;
pub mod rates;
pub mod state;

// Re-export main types for cleaner imports
pub use convert::{Conversion, InvalidAmount, convert, parse_amount};
pub use currency::{Currency, UnknownCurrency};
pub use poller::RatePoller;
pub use rates::{CurrencyPair, RankedRate, RateSource, RateTable, RatesSnapshot, Trend};
pub use state::{ExchangeState, FetchTicket, SharedState};
