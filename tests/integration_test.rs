//! Live tests against the public Kraken REST API.
//!
//! These tests require network access.
//! Run with: `cargo test --features integration-tests`

#![cfg(feature = "integration-tests")]

use chrono::Utc;

use rsiwatch::RsiwatchError;
use rsiwatch::config::StrategyConfig;
use rsiwatch::kraken::{CANDLE_LIMIT, KrakenOhlcProvider};
use rsiwatch::models::MarketKey;
use rsiwatch::snapshot::{CandleProvider, build_snapshots};

const KRAKEN_REST_URL: &str = "https://api.kraken.com";

#[tokio::test]
async fn test_fetch_btc_usd_candles() {
    let provider = KrakenOhlcProvider::new(KRAKEN_REST_URL).expect("Failed to build client");

    let candles = provider
        .fetch_candles("BTC/USD", "15m")
        .await
        .expect("Failed to fetch candles");

    assert_eq!(candles.len(), CANDLE_LIMIT);
    assert!(candles.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert!(candles.iter().all(|c| c.low <= c.high));
}

#[tokio::test]
async fn test_unknown_pair_is_rejected() {
    let provider = KrakenOhlcProvider::new(KRAKEN_REST_URL).expect("Failed to build client");

    let err = provider
        .fetch_candles("NOPE/NOPE", "15m")
        .await
        .expect_err("Unknown pair should fail");

    assert!(matches!(err, RsiwatchError::MalformedMessage(_)));
}

#[tokio::test]
async fn test_build_live_snapshots() {
    let provider = KrakenOhlcProvider::new(KRAKEN_REST_URL).expect("Failed to build client");
    let markets = [
        MarketKey::new("BTC/USD", "15m"),
        MarketKey::new("ETH/USD", "1h"),
    ];

    let snapshots =
        build_snapshots(markets.clone(), &provider, &StrategyConfig::default(), Utc::now()).await;

    assert_eq!(snapshots.len(), 2);
    for market in &markets {
        let snapshot = &snapshots[market];
        assert!((0.0..=100.0).contains(&snapshot.rsi));
        assert_eq!(
            snapshot.estimate.is_some(),
            snapshot.signal.is_pre_alert()
        );
    }
}
