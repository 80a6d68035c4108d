//! Relative Strength Index.

use rust_decimal::prelude::ToPrimitive;

use crate::models::Candle;

/// Extracts closing prices as `f64`, oldest first.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .map(|c| c.close.to_f64().unwrap_or(f64::NAN))
        .collect()
}

/// Wilder-smoothed RSI over `closes`.
///
/// Returns `closes.len() - period` readings aligned to the tail of the input,
/// so the last element is the reading for the last close. Returns an empty
/// series when there are not more than `period` closes.
pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() <= period {
        return Vec::new();
    }

    let period_f = period as f64;
    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let mut avg_gain = changes[..period].iter().map(|c| c.max(0.0)).sum::<f64>() / period_f;
    let mut avg_loss = changes[..period].iter().map(|c| (-c).max(0.0)).sum::<f64>() / period_f;

    let mut out = Vec::with_capacity(closes.len() - period);
    out.push(rsi_value(avg_gain, avg_loss));

    for &c in &changes[period..] {
        avg_gain = (avg_gain * (period_f - 1.0) + c.max(0.0)) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + (-c).max(0.0)) / period_f;
        out.push(rsi_value(avg_gain, avg_loss));
    }

    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { 50.0 } else { 100.0 };
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
