//! Exponentially weighted moving-average volatility.
//!
//! var[t] = λ·var[t-1] + (1 − λ)·r[t]², vol[t] = sqrt(var[t] · annualization).
//! Seeded either from the first squared return or from the mean of the first
//! `w` squared returns (undefined before).

use super::EwmaSeed;

/// Running variance carried from one period to the next.
#[derive(Debug, Clone, Copy, Default)]
pub struct EwmaState {
    variance: Option<f64>,
    seed_sum: f64,
    seen: usize,
}

impl EwmaState {
    pub fn step(mut self, r: f64, lambda: f64, seed: EwmaSeed) -> Self {
        self.seen += 1;
        let sq = r * r;
        self.variance = match (self.variance, seed) {
            (Some(prev), _) => Some(lambda * prev + (1.0 - lambda) * sq),
            (None, EwmaSeed::FirstSquare) => Some(sq),
            (None, EwmaSeed::Rolling(w)) => {
                self.seed_sum += sq;
                (self.seen >= w).then(|| self.seed_sum / w as f64)
            }
        };
        self
    }

    pub fn variance(&self) -> Option<f64> {
        self.variance
    }
}

pub fn ewma_volatility(
    returns: &[f64],
    lambda: f64,
    seed: EwmaSeed,
    annualization: f64,
) -> Vec<Option<f64>> {
    let mut state = EwmaState::default();
    returns
        .iter()
        .map(|&r| {
            state = state.step(r, lambda, seed);
            state.variance().map(|var| (var * annualization).sqrt())
        })
        .collect()
}
