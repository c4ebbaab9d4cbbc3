//! Rolling-window volatility.
//!
//! Sample standard deviation (n − 1 denominator) of the trailing `window`
//! returns, annualized by `sqrt(annualization)`.
//! Warmup: first (window − 1) periods are undefined.

pub fn rolling_volatility(returns: &[f64], window: usize, annualization: f64) -> Vec<Option<f64>> {
    if window < 2 {
        return vec![None; returns.len()];
    }

    let warmup = window - 1;
    let scale = annualization.sqrt();

    (0..returns.len())
        .map(|i| {
            if i < warmup {
                return None;
            }
            // Recomputed per window so values that leave the window leave no residue.
            let slice = &returns[i + 1 - window..=i];
            let mean = slice.iter().sum::<f64>() / window as f64;
            let variance = slice
                .iter()
                .map(|r| {
                    let diff = r - mean;
                    diff * diff
                })
                .sum::<f64>()
                / (window - 1) as f64;
            Some(variance.sqrt() * scale)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_warmup() {
        let vols = rolling_volatility(&[0.01, 0.02, 0.03, 0.04, 0.05], 3, 1.0);

        assert!(vols[0].is_none());
        assert!(vols[1].is_none());
        assert!(vols[2].is_some());
        assert!(vols[3].is_some());
        assert!(vols[4].is_some());
    }

    #[test]
    fn rolling_known_values() {
        // sample stddev of [2,4,4,4,5,5,7,9] is sqrt(32/7)
        let vols = rolling_volatility(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8, 1.0);
        let v = vols[7].unwrap();
        assert!((v - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn rolling_annualizes() {
        let daily = rolling_volatility(&[0.01, -0.01, 0.02], 3, 1.0);
        let annual = rolling_volatility(&[0.01, -0.01, 0.02], 3, 252.0);
        let ratio = annual[2].unwrap() / daily[2].unwrap();
        assert!((ratio - 252.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn rolling_constant_returns_is_zero_not_undefined() {
        let vols = rolling_volatility(&[0.0; 6], 3, 252.0);
        assert_eq!(vols[2], Some(0.0));
        assert_eq!(vols[5], Some(0.0));
    }

    #[test]
    fn rolling_window_below_two_is_undefined() {
        let vols = rolling_volatility(&[0.01, 0.02], 1, 252.0);
        assert!(vols.iter().all(|v| v.is_none()));
    }

    #[test]
    fn rolling_spike_leaves_window_exactly() {
        let mut returns = vec![0.0; 10];
        returns[3] = 0.2;
        let vols = rolling_volatility(&returns, 3, 1.0);

        assert_eq!(vols[2], Some(0.0));
        assert!(vols[3].unwrap() > 0.0);
        assert!(vols[5].unwrap() > 0.0);
        assert_eq!(vols[6], Some(0.0));
    }
}
