use crate::domain::snapshot::TrendSignal;

pub const SMA_SHORT: usize = 20;
pub const SMA_LONG: usize = 50;
pub const RSI_PERIOD: usize = 14;

/// Mean of the trailing `period` values; `None` until that much history exists.
pub fn sma(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period {
        return None;
    }
    let window = &closes[closes.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// RSI over the trailing `period` day-over-day deltas.
///
/// Averages are plain means of the last `period` gains and losses (not Wilder smoothing). An
/// average loss of exactly zero is treated as 1, so a series that never falls yields
/// `100 - 100 / (1 + avg_gain)` rather than a division by zero.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let recent = &closes[closes.len() - (period + 1)..];
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for pair in recent.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gain_sum += change;
        } else if change < 0.0 {
            loss_sum -= change;
        }
    }

    let avg_gain = gain_sum / period as f64;
    let mut avg_loss = loss_sum / period as f64;
    if avg_loss == 0.0 {
        avg_loss = 1.0;
    }

    let rs = avg_gain / avg_loss;
    let value = 100.0 - (100.0 / (1.0 + rs));
    (!value.is_nan()).then_some(value)
}

/// Bullish only when close > SMA(20) > SMA(50) with both averages defined.
///
/// Missing averages read as bearish, so short histories never report an uptrend.
pub fn trend_signal(close: f64, sma_short: Option<f64>, sma_long: Option<f64>) -> TrendSignal {
    match (sma_short, sma_long) {
        (Some(short), Some(long)) if close > short && short > long => TrendSignal::Bullish,
        _ => TrendSignal::Bearish,
    }
}
