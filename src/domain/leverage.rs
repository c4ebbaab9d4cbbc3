//! Raw leverage target: target_vol / vol_estimate.
//!
//! No cap is applied here. An undefined, zero or non-finite estimate yields
//! no target at all.

use crate::domain::volatility::VolatilityEstimate;

pub fn raw_target(vol_estimate: Option<f64>, target_vol: f64) -> Option<f64> {
    match vol_estimate {
        Some(vol) if vol.is_finite() && vol > 0.0 => Some(target_vol / vol),
        _ => None,
    }
}

pub fn raw_targets(estimate: &VolatilityEstimate, target_vol: f64) -> Vec<Option<f64>> {
    estimate
        .values
        .iter()
        .map(|&v| raw_target(v, target_vol))
        .collect()
}
