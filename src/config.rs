//! Application configuration loaded from environment variables.
//!
//! Every option has a default, so an empty environment yields a working
//! configuration. Threshold ordering is validated here so the process never
//! starts with undefined classification behaviour.
//!
//! - `RSI_PERIOD`, `RSI_OVERSOLD`, `RSI_OVERBOUGHT`, `RSI_WARNING_BUY`,
//!   `RSI_WARNING_SELL`, `RSI_MOMENTUM_POINTS`: strategy
//! - `PAIRS`, `TIMEFRAME`, `TIMEZONE`, `ALERT_FREQUENCY`: subscriber defaults
//! - `KRAKEN_REST_URL`: candle source
//! - `TELEGRAM_BOT_TOKEN`: enables Telegram delivery
//! - `SUBSCRIBERS_FILE`, `CYCLE_INTERVAL_SECS`: monitor loop

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use zeroize::Zeroizing;

use crate::error::RsiwatchError;
use crate::signal::{MomentumModel, Thresholds};

const DEFAULT_RSI_PERIOD: usize = 14;
const DEFAULT_PAIRS: &str = "BTC/USD,ETH/USD";
const DEFAULT_TIMEFRAME: &str = "15m";
const DEFAULT_TIMEZONE: &str = "UTC";
const DEFAULT_KRAKEN_REST_URL: &str = "https://api.kraken.com";
const DEFAULT_SUBSCRIBERS_FILE: &str = "user_data.json";
const DEFAULT_CYCLE_INTERVAL_SECS: u64 = 60;

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub strategy: StrategyConfig,
    pub defaults: SubscriberDefaults,
    pub kraken: KrakenConfig,
    pub telegram: TelegramConfig,
    pub monitor: MonitorConfig,
}

/// Oscillator and classification parameters.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    /// RSI period, also the minimum number of candles required.
    pub rsi_period: usize,
    pub thresholds: Thresholds,
    pub momentum: MomentumModel,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            rsi_period: DEFAULT_RSI_PERIOD,
            thresholds: Thresholds::default(),
            momentum: MomentumModel::default(),
        }
    }
}

/// Settings applied to subscriber records that leave a field unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberDefaults {
    pub pairs: Vec<String>,
    pub timeframe: String,
    pub timezone: String,
    pub repeat_frequency_minutes: u64,
}

impl Default for SubscriberDefaults {
    fn default() -> Self {
        Self {
            pairs: split_pairs(DEFAULT_PAIRS),
            timeframe: DEFAULT_TIMEFRAME.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            repeat_frequency_minutes: 0,
        }
    }
}

/// Kraken REST endpoint configuration.
#[derive(Debug)]
pub struct KrakenConfig {
    pub rest_url: String,
}

/// Telegram Bot API configuration.
pub struct TelegramConfig {
    pub bot_token: Option<Zeroizing<String>>,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Scheduling loop configuration.
#[derive(Debug)]
pub struct MonitorConfig {
    pub cycle_interval: Duration,
    pub subscribers_file: PathBuf,
}

/// Loads and validates the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`RsiwatchError::Config`] if a numeric variable does not parse,
/// the RSI thresholds are misordered, the period or cycle interval is zero,
/// or the default timezone is unknown.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let rsi_period: usize = parsed_var("RSI_PERIOD", DEFAULT_RSI_PERIOD)?;
    if rsi_period == 0 {
        return Err(RsiwatchError::Config("RSI_PERIOD must be at least 1".to_string()));
    }

    let defaults = Thresholds::default();
    let thresholds = Thresholds::new(
        parsed_var("RSI_OVERSOLD", defaults.oversold())?,
        parsed_var("RSI_OVERBOUGHT", defaults.overbought())?,
        parsed_var("RSI_WARNING_BUY", defaults.warning_buy())?,
        parsed_var("RSI_WARNING_SELL", defaults.warning_sell())?,
    )?;
    let momentum = MomentumModel::new(parsed_var(
        "RSI_MOMENTUM_POINTS",
        MomentumModel::default().points_per_bucket(),
    )?)?;

    let pairs = split_pairs(&non_empty_var("PAIRS").unwrap_or_else(|| DEFAULT_PAIRS.to_string()));
    if pairs.is_empty() {
        return Err(RsiwatchError::Config("PAIRS must list at least one pair".to_string()));
    }

    let timezone = non_empty_var("TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
    if timezone.parse::<Tz>().is_err() {
        return Err(RsiwatchError::Config(format!("unknown TIMEZONE {timezone}")));
    }

    let cycle_secs: u64 = parsed_var("CYCLE_INTERVAL_SECS", DEFAULT_CYCLE_INTERVAL_SECS)?;
    if cycle_secs == 0 {
        return Err(RsiwatchError::Config(
            "CYCLE_INTERVAL_SECS must be at least 1".to_string(),
        ));
    }

    Ok(AppConfig {
        strategy: StrategyConfig {
            rsi_period,
            thresholds,
            momentum,
        },
        defaults: SubscriberDefaults {
            pairs,
            timeframe: non_empty_var("TIMEFRAME").unwrap_or_else(|| DEFAULT_TIMEFRAME.to_string()),
            timezone,
            repeat_frequency_minutes: parsed_var("ALERT_FREQUENCY", 0)?,
        },
        kraken: KrakenConfig {
            rest_url: non_empty_var("KRAKEN_REST_URL")
                .unwrap_or_else(|| DEFAULT_KRAKEN_REST_URL.to_string()),
        },
        telegram: TelegramConfig {
            bot_token: non_empty_var("TELEGRAM_BOT_TOKEN").map(Zeroizing::new),
        },
        monitor: MonitorConfig {
            cycle_interval: Duration::from_secs(cycle_secs),
            subscribers_file: non_empty_var("SUBSCRIBERS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SUBSCRIBERS_FILE)),
        },
    })
}

/// Normalises a comma-separated pair list: uppercase, no whitespace, no empties.
pub fn split_pairs(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|p| p.split_whitespace().collect::<String>().to_uppercase())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Parses an environment variable, using `default` when it is absent.
fn parsed_var<T>(name: &str, default: T) -> crate::Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match non_empty_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| RsiwatchError::Config(format!("invalid {name} {raw:?}: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const ALL_VARS: [&str; 14] = [
        "RSI_PERIOD",
        "RSI_OVERSOLD",
        "RSI_OVERBOUGHT",
        "RSI_WARNING_BUY",
        "RSI_WARNING_SELL",
        "RSI_MOMENTUM_POINTS",
        "PAIRS",
        "TIMEFRAME",
        "TIMEZONE",
        "ALERT_FREQUENCY",
        "KRAKEN_REST_URL",
        "TELEGRAM_BOT_TOKEN",
        "SUBSCRIBERS_FILE",
        "CYCLE_INTERVAL_SECS",
    ];

    /// Serialises tests that touch the process environment.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    /// Helper that clears every config var, applies `vars`, runs `f`, then
    /// restores originals.
    pub(crate) fn with_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let originals: Vec<(&str, Option<String>)> = ALL_VARS
            .iter()
            .map(|k| (*k, std::env::var(k).ok()))
            .collect();

        // SAFETY: ENV_LOCK keeps other config tests from reading concurrently.
        unsafe {
            for k in ALL_VARS {
                std::env::remove_var(k);
            }
            for (k, v) in vars {
                std::env::set_var(k, v);
            }
        }

        f();

        for (k, original) in originals {
            // SAFETY: restoring original values, same single-threaded context.
            unsafe {
                match original {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[test]
    fn defaults_without_env_vars() {
        with_env(&[], || {
            let config = fetch_config().unwrap();
            assert_eq!(config.strategy.rsi_period, 14);
            assert_eq!(config.strategy.thresholds, Thresholds::default());
            assert_eq!(config.strategy.momentum.points_per_bucket(), 2.5);
            assert_eq!(config.defaults, SubscriberDefaults::default());
            assert_eq!(config.kraken.rest_url, DEFAULT_KRAKEN_REST_URL);
            assert!(config.telegram.bot_token.is_none());
            assert_eq!(config.monitor.cycle_interval, Duration::from_secs(60));
        });
    }

    #[test]
    fn overrides_from_env() {
        with_env(
            &[
                ("RSI_PERIOD", "21"),
                ("RSI_OVERSOLD", "25"),
                ("RSI_OVERBOUGHT", "75"),
                ("PAIRS", "sol/usd, xrp/usd"),
                ("TIMEFRAME", "1h"),
                ("TIMEZONE", "Asia/Dhaka"),
                ("ALERT_FREQUENCY", "15"),
                ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.strategy.rsi_period, 21);
                assert_eq!(config.strategy.thresholds.oversold(), 25.0);
                assert_eq!(config.strategy.thresholds.overbought(), 75.0);
                assert_eq!(config.defaults.pairs, vec!["SOL/USD", "XRP/USD"]);
                assert_eq!(config.defaults.timeframe, "1h");
                assert_eq!(config.defaults.timezone, "Asia/Dhaka");
                assert_eq!(config.defaults.repeat_frequency_minutes, 15);
                assert_eq!(
                    config.telegram.bot_token.as_deref().map(String::as_str),
                    Some("123:abc")
                );
            },
        );
    }

    #[test]
    fn rejects_misordered_thresholds() {
        with_env(&[("RSI_WARNING_BUY", "20")], || {
            let err = fetch_config().unwrap_err();
            assert!(matches!(err, RsiwatchError::Config(_)));
        });
    }

    #[test]
    fn rejects_unparsable_number() {
        with_env(&[("RSI_PERIOD", "fourteen")], || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("RSI_PERIOD"));
        });
    }

    #[test]
    fn rejects_zero_period() {
        with_env(&[("RSI_PERIOD", "0")], || {
            assert!(fetch_config().is_err());
        });
    }

    #[test]
    fn rejects_unknown_timezone() {
        with_env(&[("TIMEZONE", "Nowhere/City")], || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("TIMEZONE"));
        });
    }

    #[test]
    fn token_is_redacted_in_debug() {
        with_env(&[("TELEGRAM_BOT_TOKEN", "secret-token")], || {
            let config = fetch_config().unwrap();
            let debug = format!("{config:?}");
            assert!(!debug.contains("secret-token"));
            assert!(debug.contains("REDACTED"));
        });
    }

    #[test]
    fn split_pairs_normalises() {
        assert_eq!(
            split_pairs(" btc/usd ,eth/usd,, "),
            vec!["BTC/USD".to_string(), "ETH/USD".to_string()]
        );
    }
}
