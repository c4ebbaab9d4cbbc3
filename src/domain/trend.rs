//! SMA band trend filter overlay.
//!
//! trend_ok[t] = price[t+1] > (1 + band) · SMA(window)[t+1], aligned to the
//! return series. Warmup: undefined until `window` prices are available.

use crate::domain::price::PriceSeries;

pub fn trend_signal(prices: &PriceSeries, window: usize, band: f64) -> Vec<Option<bool>> {
    let closes: Vec<f64> = prices.prices().collect();
    let n_returns = closes.len().saturating_sub(1);
    if window == 0 {
        return vec![None; n_returns];
    }

    (1..closes.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let sma = closes[i + 1 - window..=i].iter().sum::<f64>() / window as f64;
            Some(closes[i] > (1.0 + band) * sma)
        })
        .collect()
}

/// Zeroes defined raw targets while the trend is not confirmed. Undefined
/// targets stay undefined.
pub fn apply_trend_filter(raw: &[Option<f64>], trend: &[Option<bool>]) -> Vec<Option<f64>> {
    raw.iter()
        .zip(trend)
        .map(|(target, ok)| target.map(|t| if *ok == Some(true) { t } else { 0.0 }))
        .collect()
}
