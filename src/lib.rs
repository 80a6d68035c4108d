//! RSI signal monitor with per-subscriber alert de-duplication.
//!
//! Fetches OHLC candles for the trading pairs subscribers care about,
//! classifies each market from its current RSI reading, and decides per
//! (subscriber, pair, timeframe) whether an alert should go out now.

pub mod alert;
pub mod config;
pub mod credentials;
pub mod error;
pub mod indicator;
pub mod kraken;
pub mod models;
pub mod monitor;
pub mod notifier;
pub mod signal;
pub mod snapshot;
pub mod subscribers;
pub mod telegram;

pub use error::{Result, RsiwatchError};
