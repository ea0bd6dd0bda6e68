//! In-memory state of a single exchange view.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::convert::{self, Conversion, InvalidAmount};
use super::currency::Currency;
use super::rates::RatesSnapshot;

pub type SharedState = Arc<Mutex<ExchangeState>>;

/// Identifies one fetch in the order it was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeState {
    from: Currency,
    to: Currency,
    amount: String,
    snapshot: Option<RatesSnapshot>,
    last_updated: Option<DateTime<Utc>>,
    pending_fetches: u32,
    next_ticket: u64,
    applied: Option<FetchTicket>,
}

impl Default for ExchangeState {
    fn default() -> Self {
        ExchangeState::new(Currency::Usdt, Currency::Rub, "1000")
    }
}

impl ExchangeState {
    pub fn new(from: Currency, to: Currency, amount: &str) -> Self {
        ExchangeState {
            from,
            to,
            amount: amount.to_string(),
            snapshot: None,
            last_updated: None,
            pending_fetches: 0,
            next_ticket: 0,
            applied: None,
        }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    pub fn from(&self) -> Currency {
        self.from
    }

    pub fn to(&self) -> Currency {
        self.to
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn snapshot(&self) -> Option<&RatesSnapshot> {
        self.snapshot.as_ref()
    }

    /// When the current snapshot was received.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn is_loading(&self) -> bool {
        self.pending_fetches > 0
    }

    /// True while there is nothing fresh to show for the rates.
    pub fn is_degraded(&self) -> bool {
        self.is_loading() || self.snapshot.is_none()
    }

    pub fn set_amount(&mut self, amount: &str) {
        self.amount = amount.to_string();
    }

    pub fn set_from(&mut self, from: Currency) {
        self.from = from;
    }

    pub fn set_to(&mut self, to: Currency) {
        self.to = to;
    }

    /// Exchanges source and target in a single mutation.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.pending_fetches += 1;
        let ticket = FetchTicket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    /// Ends the fetch behind `ticket` and replaces the snapshot wholesale,
    /// unless a fetch started later has already been applied. Returns whether
    /// the snapshot was taken.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, snapshot: RatesSnapshot) -> bool {
        self.end_fetch();
        if self.applied.is_some_and(|applied| applied > ticket) {
            return false;
        }
        self.snapshot = Some(snapshot);
        self.last_updated = Some(Utc::now());
        self.applied = Some(ticket);
        true
    }

    /// Ends one pending fetch, keeping whatever snapshot was there.
    pub fn fetch_failed(&mut self, _ticket: FetchTicket) {
        self.end_fetch();
    }

    /// Takes a snapshot obtained outside of any pending fetch.
    pub fn apply_snapshot(&mut self, snapshot: RatesSnapshot) {
        let ticket = self.begin_fetch();
        self.complete_fetch(ticket, snapshot);
    }

    fn end_fetch(&mut self) {
        self.pending_fetches = self.pending_fetches.saturating_sub(1);
    }

    pub fn conversion(&self) -> Result<Conversion, InvalidAmount> {
        convert::convert(self.from, self.to, &self.amount, self.snapshot.as_ref())
    }

    pub fn rate_line(&self) -> String {
        convert::rate_line(self.from, self.to, self.snapshot.as_ref())
    }
}
