//! Subscriber preferences.

use chrono_tz::Tz;
use tracing::warn;

use super::MarketKey;
use crate::config::SubscriberDefaults;

/// A chat that receives alerts, with its watch list and delivery settings.
///
/// Records are owned by the subscriber store; the monitor only reads them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub id: String,
    /// Trading pairs in the order the subscriber listed them.
    pub instruments: Vec<String>,
    pub timeframe: String,
    /// IANA timezone name used when rendering timestamps.
    pub timezone: String,
    /// Minutes between repeated alerts for an unchanged signal.
    /// `0` alerts once per transition.
    pub repeat_frequency_minutes: u64,
}

impl Subscriber {
    /// Creates a subscriber with the configured default settings.
    pub fn with_defaults(id: impl Into<String>, defaults: &SubscriberDefaults) -> Self {
        Self {
            id: id.into(),
            instruments: defaults.pairs.clone(),
            timeframe: defaults.timeframe.clone(),
            timezone: defaults.timezone.clone(),
            repeat_frequency_minutes: defaults.repeat_frequency_minutes,
        }
    }

    /// Markets this subscriber follows, one per instrument at its timeframe.
    pub fn markets(&self) -> impl Iterator<Item = MarketKey> + '_ {
        self.instruments
            .iter()
            .map(|instrument| MarketKey::new(instrument.as_str(), self.timeframe.as_str()))
    }

    /// Parses the subscriber's timezone, falling back to UTC.
    pub fn tz(&self) -> Tz {
        self.timezone.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                subscriber = %self.id,
                timezone = %self.timezone,
                "unknown timezone, rendering in UTC"
            );
            Tz::UTC
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscriber(timezone: &str) -> Subscriber {
        Subscriber {
            id: "42".to_string(),
            instruments: vec!["BTC/USD".to_string(), "ETH/USD".to_string()],
            timeframe: "1h".to_string(),
            timezone: timezone.to_string(),
            repeat_frequency_minutes: 0,
        }
    }

    #[test]
    fn markets_pair_each_instrument_with_timeframe() {
        let markets: Vec<MarketKey> = subscriber("UTC").markets().collect();
        assert_eq!(
            markets,
            vec![MarketKey::new("BTC/USD", "1h"), MarketKey::new("ETH/USD", "1h")]
        );
    }

    #[test]
    fn parses_known_timezone() {
        assert_eq!(subscriber("Asia/Dhaka").tz(), chrono_tz::Asia::Dhaka);
    }

    #[test]
    fn unknown_timezone_falls_back_to_utc() {
        assert_eq!(subscriber("Mars/Olympus").tz(), Tz::UTC);
    }
}
