//! Markdown message rendering for alerts and status replies.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::models::{SignalState, Snapshot, Subscriber};

fn title(signal: SignalState) -> String {
    match signal {
        SignalState::PreBuy => "⚠️ *PRE-ALERT: Approaching BUY Zone*".to_string(),
        SignalState::PreSell => "⚠️ *PRE-ALERT: Approaching SELL Zone*".to_string(),
        other => format!("🚨 *{other} SIGNAL* 🚨"),
    }
}

fn marker(signal: SignalState) -> &'static str {
    match signal {
        SignalState::Buy => "🟢",
        SignalState::Sell => "🔴",
        SignalState::PreBuy | SignalState::PreSell => "⚠️",
        SignalState::Neutral => "⚪️",
    }
}

fn local(at: DateTime<Utc>, tz: &Tz, fmt: &str) -> String {
    at.with_timezone(tz).format(fmt).to_string()
}

/// Renders a de-duplicated alert in the subscriber's timezone.
pub fn render_alert(snapshot: &Snapshot, subscriber: &Subscriber) -> String {
    let tz = subscriber.tz();
    let mut msg = format!(
        "{}\n\nSYMBOL: *{}*\nPRICE: {}\nRSI: {:.2}\nTIMEFRAME: {}\n⏰ TIME: {} ({})",
        title(snapshot.signal),
        snapshot.market.instrument,
        snapshot.price.normalize(),
        snapshot.rsi,
        snapshot.market.timeframe,
        local(snapshot.observed_at, &tz, "%Y-%m-%d %H:%M:%S"),
        tz.name(),
    );

    if let Some(est) = &snapshot.estimate {
        let _ = write!(
            msg,
            "\n⏳ *EST. ENTRY*: ~{} (in {} mins)",
            local(est.eta, &tz, "%H:%M"),
            est.eta_minutes
        );
    }

    msg
}

/// Renders one line of an on-demand status reply.
pub fn render_status(snapshot: &Snapshot, subscriber: &Subscriber) -> String {
    let tz = subscriber.tz();
    let mut msg = format!(
        "{} *{}* | {} | {}\nPrice: {} | RSI: {:.2}\nTime: {}",
        marker(snapshot.signal),
        snapshot.signal,
        snapshot.market.instrument,
        snapshot.market.timeframe,
        snapshot.price.normalize(),
        snapshot.rsi,
        local(snapshot.observed_at, &tz, "%H:%M:%S"),
    );

    if let Some(est) = &snapshot.estimate {
        let _ = write!(
            msg,
            "\n⏳ Est. Entry: ~{} ({}m)",
            local(est.eta, &tz, "%H:%M"),
            est.eta_minutes
        );
    }

    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MarketKey, TimeEstimate};
    use chrono::{TimeDelta, TimeZone};
    use rust_decimal_macros::dec;

    fn subscriber(timezone: &str) -> Subscriber {
        Subscriber {
            id: "7".to_string(),
            instruments: vec!["BTC/USD".to_string()],
            timeframe: "15m".to_string(),
            timezone: timezone.to_string(),
            repeat_frequency_minutes: 0,
        }
    }

    fn snapshot(signal: SignalState, estimate: Option<TimeEstimate>) -> Snapshot {
        Snapshot {
            market: MarketKey::new("BTC/USD", "15m"),
            signal,
            price: dec!(42150.50),
            rsi: 34.567,
            observed_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            estimate,
        }
    }

    #[test]
    fn buy_alert_in_utc() {
        let msg = render_alert(&snapshot(SignalState::Buy, None), &subscriber("UTC"));
        assert_eq!(
            msg,
            "🚨 *BUY SIGNAL* 🚨\n\nSYMBOL: *BTC/USD*\nPRICE: 42150.5\nRSI: 34.57\n\
             TIMEFRAME: 15m\n⏰ TIME: 2024-03-01 12:00:00 (UTC)"
        );
    }

    #[test]
    fn pre_buy_alert_with_estimate_in_local_time() {
        let observed = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let est = TimeEstimate {
            eta_minutes: 30,
            eta: observed + TimeDelta::minutes(30),
        };
        let msg = render_alert(
            &snapshot(SignalState::PreBuy, Some(est)),
            &subscriber("Asia/Dhaka"),
        );
        assert!(msg.starts_with("⚠️ *PRE-ALERT: Approaching BUY Zone*"));
        // Dhaka is UTC+6
        assert!(msg.contains("⏰ TIME: 2024-03-01 18:00:00 (Asia/Dhaka)"));
        assert!(msg.ends_with("⏳ *EST. ENTRY*: ~18:30 (in 30 mins)"));
    }

    #[test]
    fn pre_sell_title() {
        let msg = render_alert(&snapshot(SignalState::PreSell, None), &subscriber("UTC"));
        assert!(msg.starts_with("⚠️ *PRE-ALERT: Approaching SELL Zone*"));
    }

    #[test]
    fn status_line() {
        let msg = render_status(&snapshot(SignalState::Sell, None), &subscriber("UTC"));
        assert_eq!(
            msg,
            "🔴 *SELL* | BTC/USD | 15m\nPrice: 42150.5 | RSI: 34.57\nTime: 12:00:00"
        );
    }

    #[test]
    fn neutral_status_uses_white_marker() {
        let msg = render_status(&snapshot(SignalState::Neutral, None), &subscriber("UTC"));
        assert!(msg.starts_with("⚪️ *NEUTRAL*"));
    }
}
