//! The scheduling loop.
//!
//! [`Monitor`] runs one full cycle per tick: list subscribers, collect the
//! markets they follow, build snapshots, decide alerts per subscriber, then
//! dispatch. A cycle always completes before the next tick is polled, so
//! cycles never overlap and the [`AlertTracker`] needs no locking.
//!
//! Between cycles the loop also serves [`StatusRequest`]s arriving over a
//! channel from the chat front-end.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::Result;
use crate::alert::format::render_status;
use crate::alert::{AlertTracker, Notification, decide};
use crate::config::StrategyConfig;
use crate::models::{MarketKey, Subscriber};
use crate::notifier::Notifier;
use crate::snapshot::{CandleProvider, build_snapshots};
use crate::subscribers::SubscriberStore;

/// Reply sent to status requests from unknown subscribers.
const NOT_SUBSCRIBED_REPLY: &str = "Please /start first.";

/// A subscriber asked for the current state of their markets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRequest {
    pub subscriber_id: String,
}

/// Outcome counters for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub subscribers: usize,
    pub markets_requested: usize,
    pub snapshots_built: usize,
    pub notifications_sent: usize,
    pub delivery_failures: usize,
}

/// Collects the unique markets followed by any subscriber.
pub fn required_markets<'a>(
    subscribers: impl IntoIterator<Item = &'a Subscriber>,
) -> BTreeSet<MarketKey> {
    subscribers.into_iter().flat_map(|s| s.markets()).collect()
}

/// Drives the classify-and-alert cycle.
pub struct Monitor {
    provider: Arc<dyn CandleProvider>,
    store: Arc<dyn SubscriberStore>,
    notifier: Arc<dyn Notifier>,
    strategy: StrategyConfig,
    tracker: AlertTracker,
    cycle_interval: Duration,
}

impl Monitor {
    #[must_use]
    pub fn new(
        provider: Arc<dyn CandleProvider>,
        store: Arc<dyn SubscriberStore>,
        notifier: Arc<dyn Notifier>,
        strategy: StrategyConfig,
        cycle_interval: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            notifier,
            strategy,
            tracker: AlertTracker::new(),
            cycle_interval,
        }
    }

    /// Returns the alert state accumulated so far.
    pub fn tracker(&self) -> &AlertTracker {
        &self.tracker
    }

    /// Runs one full cycle at time `now`.
    ///
    /// Markets without data and failed deliveries are logged and counted,
    /// never propagated.
    ///
    /// # Errors
    ///
    /// Returns an error only if the subscriber list cannot be loaded.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> Result<CycleReport> {
        let subscribers = self.store.list_subscribers().await?;
        let mut report = CycleReport {
            subscribers: subscribers.len(),
            ..CycleReport::default()
        };
        if subscribers.is_empty() {
            return Ok(report);
        }

        let markets = required_markets(subscribers.values());
        report.markets_requested = markets.len();
        info!(markets = markets.len(), "processing market configs");

        let snapshots = build_snapshots(markets, self.provider.as_ref(), &self.strategy, now).await;
        report.snapshots_built = snapshots.len();
        for snapshot in snapshots.values() {
            info!(
                instrument = %snapshot.market.instrument,
                timeframe = %snapshot.market.timeframe,
                rsi = snapshot.rsi,
                signal = snapshot.signal.as_str(),
                "market classified"
            );
        }

        let mut outbox: Vec<Notification> = Vec::new();
        for subscriber in subscribers.values() {
            for market in subscriber.markets() {
                let Some(snapshot) = snapshots.get(&market) else {
                    continue;
                };
                if let Some(notification) =
                    decide(subscriber, &market, snapshot, &mut self.tracker, now)
                {
                    outbox.push(notification);
                }
            }
        }

        for notification in outbox {
            match self
                .notifier
                .notify(&notification.subscriber_id, &notification.text)
                .await
            {
                Ok(()) => report.notifications_sent += 1,
                Err(e) => {
                    report.delivery_failures += 1;
                    warn!(
                        subscriber = %notification.subscriber_id,
                        market = %notification.market,
                        error = %e,
                        "failed to deliver alert"
                    );
                }
            }
        }

        Ok(report)
    }

    /// Replies to a status request with one message per available market.
    ///
    /// Bypasses de-duplication and leaves alert state untouched. Returns the
    /// number of messages delivered.
    ///
    /// # Errors
    ///
    /// Returns an error only if the subscriber list cannot be loaded.
    pub async fn handle_status_request(
        &self,
        request: &StatusRequest,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let subscribers = self.store.list_subscribers().await?;
        let Some(subscriber) = subscribers.get(&request.subscriber_id) else {
            self.deliver(&request.subscriber_id, NOT_SUBSCRIBED_REPLY).await;
            return Ok(0);
        };

        let snapshots =
            build_snapshots(subscriber.markets(), self.provider.as_ref(), &self.strategy, now)
                .await;

        let mut delivered = 0;
        for market in subscriber.markets() {
            if let Some(snapshot) = snapshots.get(&market)
                && self
                    .deliver(&subscriber.id, &render_status(snapshot, subscriber))
                    .await
            {
                delivered += 1;
            }
        }

        Ok(delivered)
    }

    async fn deliver(&self, subscriber_id: &str, text: &str) -> bool {
        match self.notifier.notify(subscriber_id, text).await {
            Ok(()) => true,
            Err(e) => {
                warn!(subscriber = subscriber_id, error = %e, "failed to deliver message");
                false
            }
        }
    }

    /// Runs cycles on a fixed interval until Ctrl-C, serving status
    /// requests between cycles.
    ///
    /// # Errors
    ///
    /// Returns an error if the Ctrl-C handler cannot be installed.
    pub async fn run(mut self, mut status_rx: mpsc::Receiver<StatusRequest>) -> Result<()> {
        let mut ticker = tokio::time::interval(self.cycle_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);
        let mut status_open = true;

        info!(interval = ?self.cycle_interval, "monitor started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.run_cycle(Utc::now()).await {
                        Ok(report) => info!(?report, "cycle complete"),
                        Err(e) => error!(error = %e, "cycle aborted"),
                    }
                }
                request = status_rx.recv(), if status_open => match request {
                    Some(request) => {
                        if let Err(e) = self.handle_status_request(&request, Utc::now()).await {
                            error!(error = %e, "status request failed");
                        }
                    }
                    None => status_open = false,
                },
                signal = &mut shutdown => {
                    signal.map_err(|e| crate::RsiwatchError::Io(format!("ctrl-c handler: {e}")))?;
                    info!("shutting down");
                    return Ok(());
                }
            }
        }
    }
}
