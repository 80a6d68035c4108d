//! OHLC candlestick models and the Kraken REST `OHLC` response.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::Result;
use crate::error::RsiwatchError;

/// A single OHLC candlestick bar. Sequences are ordered oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candle {
    /// Start of the bar, in Unix seconds.
    pub timestamp: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Volume-weighted average price for this candle.
    pub vwap: Decimal,
    pub volume: Decimal,
    pub count: u64,
}

/// One row of the Kraken `OHLC` result array:
/// `[time, open, high, low, close, vwap, volume, count]`.
#[derive(Debug, Deserialize)]
struct OhlcRow(i64, Decimal, Decimal, Decimal, Decimal, Decimal, Decimal, u64);

impl From<OhlcRow> for Candle {
    fn from(row: OhlcRow) -> Self {
        let OhlcRow(timestamp, open, high, low, close, vwap, volume, count) = row;
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            vwap,
            volume,
            count,
        }
    }
}

/// Envelope returned by `GET /0/public/OHLC`.
///
/// The `result` object holds one entry keyed by Kraken's internal pair name
/// (e.g. `XXBTZUSD`) plus a `last` cursor.
#[derive(Debug, Deserialize)]
pub struct OhlcResponse {
    #[serde(default)]
    pub error: Vec<String>,
    #[serde(default)]
    pub result: Option<HashMap<String, serde_json::Value>>,
}

impl OhlcResponse {
    /// Extracts the candle rows, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RsiwatchError::MalformedMessage`] if the API reported an
    /// error or the result has no pair entry.
    pub fn into_candles(self) -> Result<Vec<Candle>> {
        if !self.error.is_empty() {
            return Err(RsiwatchError::MalformedMessage(format!(
                "Kraken API error: {}",
                self.error.join(", ")
            )));
        }

        let rows = self
            .result
            .and_then(|mut result| {
                let key = result.keys().find(|k| k.as_str() != "last").cloned()?;
                result.remove(&key)
            })
            .ok_or_else(|| {
                RsiwatchError::MalformedMessage("missing pair entry in OHLC response".into())
            })?;

        let rows: Vec<OhlcRow> = serde_json::from_value(rows)?;
        let mut candles: Vec<Candle> = rows.into_iter().map(Candle::from).collect();
        candles.sort_by_key(|c| c.timestamp);

        Ok(candles)
    }
}
