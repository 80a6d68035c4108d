//! Kraken public REST candle source.
//!
//! Fetches bars from
//! [`GET /0/public/OHLC`](https://docs.kraken.com/api/docs/rest-api/get-ohlc-data).
//! Kraken returns up to 720 bars; only the most recent [`CANDLE_LIMIT`] are
//! kept, which is plenty of warmup for any sensible RSI period.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::Result;
use crate::error::RsiwatchError;
use crate::models::Candle;
use crate::models::candle::OhlcResponse;
use crate::snapshot::CandleProvider;

const OHLC_PATH: &str = "/0/public/OHLC";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Number of most recent candles kept per fetch.
pub const CANDLE_LIMIT: usize = 100;

/// Maps a timeframe label to a Kraken OHLC interval in minutes.
///
/// Kraken has no 3m, 2h, 6h, 8h or 12h bars.
pub fn interval_minutes(timeframe: &str) -> Option<u32> {
    let minutes = match timeframe {
        "1m" => 1,
        "5m" => 5,
        "15m" => 15,
        "30m" => 30,
        "1h" => 60,
        "4h" => 240,
        "1d" => 1440,
        "1w" => 10080,
        _ => return None,
    };
    Some(minutes)
}

/// Converts `BTC/USD` style symbols to the REST `pair` parameter (`BTCUSD`).
pub fn rest_pair(instrument: &str) -> String {
    instrument.chars().filter(|c| *c != '/').collect()
}

/// [`CandleProvider`] backed by Kraken's public REST API.
pub struct KrakenOhlcProvider {
    client: reqwest::Client,
    base_url: String,
}

impl KrakenOhlcProvider {
    /// Creates a provider for the given REST base URL
    /// (e.g. `https://api.kraken.com`).
    ///
    /// # Errors
    ///
    /// Returns [`RsiwatchError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CandleProvider for KrakenOhlcProvider {
    async fn fetch_candles(&self, instrument: &str, timeframe: &str) -> Result<Vec<Candle>> {
        let interval = interval_minutes(timeframe).ok_or_else(|| {
            RsiwatchError::DataUnavailable {
                market: format!("{instrument}|{timeframe}"),
                reason: format!("Kraken has no {timeframe} candles"),
            }
        })?;

        let response = self
            .client
            .get(format!("{}{OHLC_PATH}", self.base_url))
            .query(&[
                ("pair", rest_pair(instrument)),
                ("interval", interval.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: OhlcResponse = response.json().await?;
        let mut candles = body.into_candles()?;
        if candles.len() > CANDLE_LIMIT {
            candles.drain(..candles.len() - CANDLE_LIMIT);
        }

        debug!(
            instrument,
            timeframe,
            count = candles.len(),
            "fetched candles"
        );
        Ok(candles)
    }
}
