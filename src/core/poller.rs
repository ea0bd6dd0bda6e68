//! Periodic refresh of the rates snapshot for one view.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::rates::RateSource;
use super::state::SharedState;

/// Default refresh period.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30 * 60);
const MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone)]
struct PollContext {
    source: Arc<dyn RateSource>,
    state: SharedState,
    token: CancellationToken,
    updates: Arc<watch::Sender<u64>>,
}

impl PollContext {
    fn notify(&self) {
        self.updates.send_modify(|generation| *generation += 1);
    }

    async fn refresh(&self) {
        if self.token.is_cancelled() {
            return;
        }

        let ticket = self.state.lock().await.begin_fetch();
        self.notify();

        let result = tokio::select! {
            _ = self.token.cancelled() => {
                debug!("Poller stopped while fetching rates");
                return;
            }
            result = self.source.fetch_snapshot() => result,
        };

        let mut state = self.state.lock().await;
        if self.token.is_cancelled() {
            debug!("Discarding rates that arrived after the poller stopped");
            return;
        }
        match result {
            Ok(snapshot) => {
                let rates = snapshot.rates.len();
                let updated_at = snapshot.updated_at;
                if state.complete_fetch(ticket, snapshot) {
                    info!(rates, %updated_at, "Rates refreshed");
                } else {
                    debug!(?ticket, "Discarding rates from a fetch overtaken by a newer one");
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to refresh rates, keeping previous snapshot");
                state.fetch_failed(ticket);
            }
        }
        drop(state);
        self.notify();
    }
}

/// Owns the recurring refresh of one view. Fetches immediately on
/// [`start`](RatePoller::start) and then once per interval until
/// [`stop`](RatePoller::stop) or drop. Nothing touches the state after stop.
pub struct RatePoller {
    ctx: PollContext,
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl RatePoller {
    pub fn new(source: Arc<dyn RateSource>, state: SharedState, interval: Duration) -> Self {
        let (updates, _) = watch::channel(0);
        RatePoller {
            ctx: PollContext {
                source,
                state,
                token: CancellationToken::new(),
                updates: Arc::new(updates),
            },
            interval: interval.max(MIN_INTERVAL),
            task: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_active(&self) -> bool {
        self.task.is_some() && !self.ctx.token.is_cancelled()
    }

    /// Receives a new value after every state change made by the poller.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.ctx.updates.subscribe()
    }

    pub fn start(&mut self) {
        if self.task.is_some() {
            warn!("Rate poller already running");
            return;
        }
        if self.ctx.token.is_cancelled() {
            warn!("Rate poller was stopped and cannot be restarted");
            return;
        }

        let ctx = self.ctx.clone();
        let period = self.interval;
        info!(interval = ?period, "Starting rate poller");
        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ctx.token.cancelled() => break,
                    _ = ticker.tick() => ctx.refresh().await,
                }
            }
            debug!("Rate poller loop finished");
        }));
    }

    /// Fetches once outside the schedule. Ignored unless the poller is active.
    pub fn refresh_now(&self) {
        if !self.is_active() {
            debug!("Ignoring refresh request on inactive poller");
            return;
        }
        let ctx = self.ctx.clone();
        tokio::spawn(async move { ctx.refresh().await });
    }

    pub fn stop(&mut self) {
        if self.ctx.token.is_cancelled() {
            return;
        }
        info!("Stopping rate poller");
        self.ctx.token.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for RatePoller {
    fn drop(&mut self) {
        self.stop();
    }
}
