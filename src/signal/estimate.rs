//! Time-to-target estimation for pre-alert signals.
//!
//! A deliberately crude linear projection: RSI is assumed to move a fixed
//! number of points per candle toward the target. The result is a hint for
//! humans reading an alert, not a forecast.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::warn;

use crate::Result;
use crate::error::RsiwatchError;
use crate::models::TimeEstimate;

/// Oscillator points assumed to be covered per candle.
pub const DEFAULT_POINTS_PER_BUCKET: f64 = 2.5;

/// Candle duration assumed for timeframes missing from the lookup table.
pub const DEFAULT_TIMEFRAME_MINUTES: u64 = 15;

/// Returns the candle duration in minutes for a known timeframe label.
pub fn timeframe_minutes(timeframe: &str) -> Option<u64> {
    let minutes = match timeframe {
        "1m" => 1,
        "3m" => 3,
        "5m" => 5,
        "15m" => 15,
        "30m" => 30,
        "1h" => 60,
        "2h" => 120,
        "4h" => 240,
        "1d" => 1440,
        _ => return None,
    };
    Some(minutes)
}

/// Linear RSI-velocity model used to project an ETA.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumModel {
    points_per_bucket: f64,
}

impl Default for MomentumModel {
    fn default() -> Self {
        Self {
            points_per_bucket: DEFAULT_POINTS_PER_BUCKET,
        }
    }
}

impl MomentumModel {
    /// Creates a model assuming `points_per_bucket` RSI points per candle.
    ///
    /// # Errors
    ///
    /// Returns [`RsiwatchError::Config`] unless the value is finite and positive.
    pub fn new(points_per_bucket: f64) -> Result<Self> {
        if !points_per_bucket.is_finite() || points_per_bucket <= 0.0 {
            return Err(RsiwatchError::Config(format!(
                "momentum points per bucket must be positive, got {points_per_bucket}"
            )));
        }
        Ok(Self { points_per_bucket })
    }

    pub fn points_per_bucket(&self) -> f64 {
        self.points_per_bucket
    }

    /// Projects when `current` reaches `target` on `timeframe` candles.
    ///
    /// Unknown timeframes are treated as [`DEFAULT_TIMEFRAME_MINUTES`]. Projections
    /// beyond the representable range saturate.
    pub fn estimate(
        &self,
        current: f64,
        target: f64,
        timeframe: &str,
        now: DateTime<Utc>,
    ) -> TimeEstimate {
        let minutes_per_bucket = timeframe_minutes(timeframe).unwrap_or_else(|| {
            warn!(
                timeframe,
                default_minutes = DEFAULT_TIMEFRAME_MINUTES,
                "unknown timeframe, using default candle duration"
            );
            DEFAULT_TIMEFRAME_MINUTES
        });

        let distance = (current - target).abs();
        // `as` saturates for out-of-range floats.
        let buckets = (distance / self.points_per_bucket).ceil() as u64;
        let eta_minutes = buckets.saturating_mul(minutes_per_bucket);
        let eta = i64::try_from(eta_minutes)
            .ok()
            .and_then(TimeDelta::try_minutes)
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        TimeEstimate { eta_minutes, eta }
    }
}

/// Projects an ETA with the default 2.5 points-per-candle model.
pub fn estimate(current: f64, target: f64, timeframe: &str, now: DateTime<Utc>) -> TimeEstimate {
    MomentumModel::default().estimate(current, target, timeframe, now)
}
