//! Per-cycle market snapshots.
//!
//! Each unique (instrument, timeframe) pair requested by any subscriber is
//! fetched and classified exactly once per cycle. Fetches run concurrently,
//! at most [`MAX_CONCURRENT_FETCHES`] at a time; a pair that fails or lacks data is logged and left out of the result so
//! the rest of the cycle carries on.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::Result;
use crate::config::StrategyConfig;
use crate::error::RsiwatchError;
use crate::indicator::{closes, rsi};
use crate::models::{Candle, MarketKey, Snapshot};
use crate::signal::classify;

/// Upper bound on in-flight candle fetches, to stay under public API rate limits.
pub const MAX_CONCURRENT_FETCHES: usize = 8;

/// Source of OHLC candles for a market.
#[async_trait]
pub trait CandleProvider: Send + Sync {
    /// Returns candles for `instrument` on `timeframe`, oldest first.
    async fn fetch_candles(&self, instrument: &str, timeframe: &str) -> Result<Vec<Candle>>;
}

/// Builds snapshots for every unique market in `requests`.
///
/// Markets whose fetch fails or returns too little data are omitted.
pub async fn build_snapshots<P, I>(
    requests: I,
    provider: &P,
    strategy: &StrategyConfig,
    now: DateTime<Utc>,
) -> HashMap<MarketKey, Snapshot>
where
    P: CandleProvider + ?Sized,
    I: IntoIterator<Item = MarketKey>,
{
    let unique: BTreeSet<MarketKey> = requests.into_iter().collect();

    let results: Vec<Result<Snapshot>> = stream::iter(unique)
        .map(|market| build_snapshot(market, provider, strategy, now))
        .buffer_unordered(MAX_CONCURRENT_FETCHES)
        .collect()
        .await;

    results
        .into_iter()
        .filter_map(|result| match result {
            Ok(snapshot) => Some((snapshot.market.clone(), snapshot)),
            Err(e) => {
                warn!(error = %e, "skipping market this cycle");
                None
            }
        })
        .collect()
}

/// Fetches candles for one market and classifies it.
///
/// # Errors
///
/// Returns [`RsiwatchError::DataUnavailable`] if the fetch fails or returns
/// fewer candles than the RSI period.
pub async fn build_snapshot<P>(
    market: MarketKey,
    provider: &P,
    strategy: &StrategyConfig,
    now: DateTime<Utc>,
) -> Result<Snapshot>
where
    P: CandleProvider + ?Sized,
{
    let candles = provider
        .fetch_candles(&market.instrument, &market.timeframe)
        .await
        .map_err(|e| match e {
            err @ RsiwatchError::DataUnavailable { .. } => err,
            other => unavailable(&market, other.to_string()),
        })?;

    snapshot_from_candles(market, &candles, strategy, now)
}

/// Classifies a market from already-fetched candles.
///
/// # Errors
///
/// Returns [`RsiwatchError::DataUnavailable`] if there are fewer candles than
/// the RSI period or the oscillator produces no reading.
pub fn snapshot_from_candles(
    market: MarketKey,
    candles: &[Candle],
    strategy: &StrategyConfig,
    now: DateTime<Utc>,
) -> Result<Snapshot> {
    if candles.len() < strategy.rsi_period {
        return Err(unavailable(
            &market,
            format!(
                "{} candles, need at least {}",
                candles.len(),
                strategy.rsi_period
            ),
        ));
    }

    let series = rsi(&closes(candles), strategy.rsi_period);
    let (Some(&reading), Some(last)) = (series.last(), candles.last()) else {
        return Err(unavailable(&market, "not enough data for an RSI reading".to_string()));
    };

    let (signal, estimate) = classify(
        reading,
        &strategy.thresholds,
        &strategy.momentum,
        &market.timeframe,
        now,
    );
    debug!(
        instrument = %market.instrument,
        timeframe = %market.timeframe,
        rsi = reading,
        signal = signal.as_str(),
        "classified market"
    );

    Ok(Snapshot {
        market,
        signal,
        price: last.close,
        rsi: reading,
        observed_at: now,
        estimate,
    })
}

fn unavailable(market: &MarketKey, reason: String) -> RsiwatchError {
    RsiwatchError::DataUnavailable {
        market: market.to_string(),
        reason,
    }
}
