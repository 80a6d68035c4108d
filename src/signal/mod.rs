//! RSI signal classification.
//!
//! Maps the current oscillator reading onto a [`SignalState`] using
//! configurable thresholds. The extreme thresholds are strict and the
//! warning thresholds are inclusive: a reading of exactly `oversold` is
//! `PRE-BUY`, not `BUY`, and exactly `overbought` is `PRE-SELL`.

pub mod estimate;

use chrono::{DateTime, Utc};

use crate::Result;
use crate::error::RsiwatchError;
use crate::models::{SignalState, TimeEstimate};
pub use estimate::{MomentumModel, timeframe_minutes};

/// RSI thresholds. Ordering `oversold < warning_buy <= warning_sell < overbought`
/// is enforced on construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    oversold: f64,
    overbought: f64,
    warning_buy: f64,
    warning_sell: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            oversold: 30.0,
            overbought: 70.0,
            warning_buy: 40.0,
            warning_sell: 60.0,
        }
    }
}

impl Thresholds {
    /// Validates and builds a threshold set.
    ///
    /// # Errors
    ///
    /// Returns [`RsiwatchError::Config`] if the ordering does not hold
    /// (including when any value is NaN).
    pub fn new(oversold: f64, overbought: f64, warning_buy: f64, warning_sell: f64) -> Result<Self> {
        let ordered =
            oversold < warning_buy && warning_buy <= warning_sell && warning_sell < overbought;
        if !ordered {
            return Err(RsiwatchError::Config(format!(
                "RSI thresholds must satisfy oversold < warning_buy <= warning_sell < overbought, \
                 got {oversold} / {warning_buy} / {warning_sell} / {overbought}"
            )));
        }
        Ok(Self {
            oversold,
            overbought,
            warning_buy,
            warning_sell,
        })
    }

    pub fn oversold(&self) -> f64 {
        self.oversold
    }

    pub fn overbought(&self) -> f64 {
        self.overbought
    }

    pub fn warning_buy(&self) -> f64 {
        self.warning_buy
    }

    pub fn warning_sell(&self) -> f64 {
        self.warning_sell
    }
}

/// Classifies an RSI reading. Pre-alert states carry an ETA toward their
/// extreme threshold; every other state carries none.
pub fn classify(
    reading: f64,
    thresholds: &Thresholds,
    momentum: &MomentumModel,
    timeframe: &str,
    now: DateTime<Utc>,
) -> (SignalState, Option<TimeEstimate>) {
    if reading < thresholds.oversold {
        (SignalState::Buy, None)
    } else if reading > thresholds.overbought {
        (SignalState::Sell, None)
    } else if reading <= thresholds.warning_buy {
        let eta = momentum.estimate(reading, thresholds.oversold, timeframe, now);
        (SignalState::PreBuy, Some(eta))
    } else if reading >= thresholds.warning_sell {
        let eta = momentum.estimate(reading, thresholds.overbought, timeframe, now);
        (SignalState::PreSell, Some(eta))
    } else {
        (SignalState::Neutral, None)
    }
}
