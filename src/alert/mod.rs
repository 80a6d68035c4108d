//! Alert decision engine.
//!
//! Tracks, per (subscriber, instrument, timeframe), the last signal that was
//! alerted and when, and decides whether the current snapshot warrants a new
//! notification:
//!
//! - `NEUTRAL` never alerts and resets the key, so the next non-neutral
//!   reading counts as a transition.
//! - A signal different from the last one always alerts.
//! - An unchanged signal alerts again only once the subscriber's repeat
//!   frequency has elapsed; a frequency of `0` alerts once per transition.
//!
//! State is committed when the decision is made, before delivery. A failed
//! send is not retried.

pub mod format;

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::models::{MarketKey, SignalState, Snapshot, Subscriber};

/// Alert state for one (subscriber, market) key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertTrackingEntry {
    /// `None` until the first evaluation for this key.
    pub last_signal: Option<SignalState>,
    /// Time of the last decided notification. Never moves backwards.
    pub last_alert_at: Option<DateTime<Utc>>,
}

/// A rendered alert ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subscriber_id: String,
    pub market: MarketKey,
    pub signal: SignalState,
    pub text: String,
}

/// In-memory alert state, keyed by subscriber id and market.
///
/// Lives for the lifetime of the monitor; a restart simply re-alerts the
/// current signals.
#[derive(Debug, Default)]
pub struct AlertTracker {
    entries: HashMap<(String, MarketKey), AlertTrackingEntry>,
}

impl AlertTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for a key, if it has been evaluated before.
    pub fn get(&self, subscriber_id: &str, market: &MarketKey) -> Option<&AlertTrackingEntry> {
        self.entries.get(&(subscriber_id.to_string(), market.clone()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_mut(&mut self, subscriber_id: &str, market: &MarketKey) -> &mut AlertTrackingEntry {
        self.entries
            .entry((subscriber_id.to_string(), market.clone()))
            .or_insert(AlertTrackingEntry {
                last_signal: None,
                last_alert_at: None,
            })
    }
}

/// Repeat interval for a subscriber setting. `None` when repeats are off or
/// the interval is too long to ever elapse.
fn repeat_interval(minutes: u64) -> Option<TimeDelta> {
    if minutes == 0 {
        return None;
    }
    i64::try_from(minutes).ok().and_then(TimeDelta::try_minutes)
}

/// Decides whether `snapshot` should be alerted to `subscriber` now, and
/// updates `tracker` accordingly.
pub fn decide(
    subscriber: &Subscriber,
    market: &MarketKey,
    snapshot: &Snapshot,
    tracker: &mut AlertTracker,
    now: DateTime<Utc>,
) -> Option<Notification> {
    let entry = tracker.entry_mut(&subscriber.id, market);

    if snapshot.signal == SignalState::Neutral {
        entry.last_signal = Some(SignalState::Neutral);
        return None;
    }

    let changed = entry.last_signal != Some(snapshot.signal);
    let repeat_due = repeat_interval(subscriber.repeat_frequency_minutes).is_some_and(|every| {
        entry
            .last_alert_at
            .is_none_or(|last| now.signed_duration_since(last) >= every)
    });

    if !(changed || repeat_due) {
        return None;
    }

    debug!(
        subscriber = %subscriber.id,
        market = %market,
        signal = snapshot.signal.as_str(),
        changed,
        "alert decided"
    );

    entry.last_signal = Some(snapshot.signal);
    entry.last_alert_at = Some(entry.last_alert_at.map_or(now, |last| last.max(now)));

    Some(Notification {
        subscriber_id: subscriber.id.clone(),
        market: market.clone(),
        signal: snapshot.signal,
        text: format::render_alert(snapshot, subscriber),
    })
}
