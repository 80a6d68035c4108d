//! Shared test doubles and candle builders.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use rsiwatch::models::{Candle, MarketKey, Subscriber};
use rsiwatch::notifier::Notifier;
use rsiwatch::snapshot::CandleProvider;
use rsiwatch::{Result, RsiwatchError};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

pub fn subscriber(id: &str, pairs: &[&str], repeat: u64) -> Subscriber {
    Subscriber {
        id: id.to_string(),
        instruments: pairs.iter().map(|p| p.to_string()).collect(),
        timeframe: "15m".to_string(),
        timezone: "UTC".to_string(),
        repeat_frequency_minutes: repeat,
    }
}

pub fn candles(closes: &[i64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Candle {
            timestamp: 1_709_294_400 + i as i64 * 900,
            open: Decimal::from(c),
            high: Decimal::from(c),
            low: Decimal::from(c),
            close: Decimal::from(c),
            vwap: Decimal::from(c),
            volume: Decimal::ONE,
            count: 1,
        })
        .collect()
}

/// Steady decline: RSI 0, classified BUY.
pub fn falling() -> Vec<Candle> {
    candles(&(0..30).map(|i| 1000 - i * 10).collect::<Vec<_>>())
}

/// Steady rise: RSI 100, classified SELL.
pub fn rising() -> Vec<Candle> {
    candles(&(0..30).map(|i| 1000 + i * 10).collect::<Vec<_>>())
}

/// Unchanged closes: RSI 50, classified NEUTRAL.
pub fn flat() -> Vec<Candle> {
    candles(&[1000; 30])
}

/// Fifteen closes with one +7 and one -13 move: a single RSI reading of 35
/// (PRE-BUY with the default thresholds).
pub fn approaching_buy() -> Vec<Candle> {
    let mut closes = vec![100, 107, 94];
    closes.extend([94; 12]);
    candles(&closes)
}

/// Candle provider returning scripted data per instrument and counting fetches.
#[derive(Default)]
pub struct ScriptedProvider {
    data: Mutex<HashMap<String, Vec<Candle>>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<MarketKey, usize>>,
}

impl ScriptedProvider {
    pub fn set(&self, instrument: &str, candles: Vec<Candle>) {
        self.data
            .lock()
            .unwrap()
            .insert(instrument.to_string(), candles);
    }

    pub fn fail(&self, instrument: &str) {
        self.failing.lock().unwrap().insert(instrument.to_string());
    }

    pub fn calls(&self, instrument: &str, timeframe: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&MarketKey::new(instrument, timeframe))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl CandleProvider for ScriptedProvider {
    async fn fetch_candles(&self, instrument: &str, timeframe: &str) -> Result<Vec<Candle>> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(MarketKey::new(instrument, timeframe))
            .or_default() += 1;

        if self.failing.lock().unwrap().contains(instrument) {
            return Err(RsiwatchError::MalformedMessage(format!(
                "simulated outage for {instrument}"
            )));
        }

        Ok(self
            .data
            .lock()
            .unwrap()
            .get(instrument)
            .cloned()
            .unwrap_or_default())
    }
}

/// Notifier recording every delivery; chosen subscribers always fail.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingNotifier {
    pub fn fail_for(&self, subscriber_id: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert(subscriber_id.to_string());
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<(String, String)> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, subscriber_id: &str, text: &str) -> Result<()> {
        if self.failing.lock().unwrap().contains(subscriber_id) {
            return Err(RsiwatchError::Delivery("chat not found".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((subscriber_id.to_string(), text.to_string()));
        Ok(())
    }
}
