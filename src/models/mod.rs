//! Shared data models.
//!
//! Contains market keys, classified signals, per-cycle snapshots and
//! subscriber preferences, plus the Kraken candle wire types.

pub mod candle;
pub mod subscriber;

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

pub use candle::Candle;
pub use subscriber::Subscriber;

/// An (instrument, timeframe) pair. Snapshots and alert state are keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarketKey {
    pub instrument: String,
    pub timeframe: String,
}

impl MarketKey {
    pub fn new(instrument: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            timeframe: timeframe.into(),
        }
    }
}

impl fmt::Display for MarketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.instrument, self.timeframe)
    }
}

/// Classified market state derived from the current RSI reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalState {
    Neutral,
    /// RSI inside the warning band above `oversold`.
    PreBuy,
    Buy,
    /// RSI inside the warning band below `overbought`.
    PreSell,
    Sell,
}

impl SignalState {
    /// Returns the display name used in alert messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalState::Neutral => "NEUTRAL",
            SignalState::PreBuy => "PRE-BUY",
            SignalState::Buy => "BUY",
            SignalState::PreSell => "PRE-SELL",
            SignalState::Sell => "SELL",
        }
    }

    /// Returns `true` for the "approaching" states that carry an estimate.
    pub fn is_pre_alert(&self) -> bool {
        matches!(self, SignalState::PreBuy | SignalState::PreSell)
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Heuristic projection of when RSI reaches its target threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeEstimate {
    pub eta_minutes: u64,
    pub eta: DateTime<Utc>,
}

/// Classified view of one market for one cycle.
///
/// Built once per cycle and shared read-only by every subscriber
/// following the same market.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub market: MarketKey,
    pub signal: SignalState,
    /// Close of the most recent candle.
    pub price: Decimal,
    pub rsi: f64,
    pub observed_at: DateTime<Utc>,
    pub estimate: Option<TimeEstimate>,
}
