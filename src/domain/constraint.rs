//! Constraint engine: turns raw leverage targets into held positions.
//!
//! Applied sequentially, one period at a time, carrying the previously held
//! position in [`ConstraintState`]. Per period:
//! 1. gate on minimum history, then resolve an undefined target via the policy
//! 2. clip to the leverage cap (`[0, cap]` when long-only)
//! 3. trade only if the move from the HELD position reaches the threshold

use std::fmt;
use std::str::FromStr;

/// What to do when no target is available for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndefinedPolicy {
    /// Keep the position held in the previous period.
    Hold,
    /// Propose a flat (0.0) position.
    #[default]
    Flat,
}

impl fmt::Display for UndefinedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndefinedPolicy::Hold => write!(f, "hold"),
            UndefinedPolicy::Flat => write!(f, "flat"),
        }
    }
}

impl FromStr for UndefinedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hold" => Ok(UndefinedPolicy::Hold),
            "flat" => Ok(UndefinedPolicy::Flat),
            other => Err(format!("unknown policy '{}', expected hold or flat", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintParams {
    pub prior_position: f64,
    pub leverage_cap: f64,
    pub turnover_threshold: f64,
    pub long_only: bool,
    pub min_history: usize,
    pub undefined_policy: UndefinedPolicy,
}

impl ConstraintParams {
    pub fn bounds(&self) -> (f64, f64) {
        if self.long_only {
            (0.0, self.leverage_cap)
        } else {
            (-self.leverage_cap, self.leverage_cap)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintState {
    pub held: f64,
    pub rebalances: usize,
}

impl ConstraintState {
    pub fn new(prior_position: f64) -> Self {
        Self {
            held: prior_position,
            rebalances: 0,
        }
    }

    pub fn step(self, t: usize, raw: Option<f64>, params: &ConstraintParams) -> Self {
        let gated = if t + 1 < params.min_history { None } else { raw };

        let candidate = match (gated, params.undefined_policy) {
            (Some(target), _) => target,
            (None, UndefinedPolicy::Hold) => return self,
            (None, UndefinedPolicy::Flat) => 0.0,
        };

        let (lo, hi) = params.bounds();
        let clipped = candidate.clamp(lo, hi);

        if (clipped - self.held).abs() < params.turnover_threshold || clipped == self.held {
            self
        } else {
            Self {
                held: clipped,
                rebalances: self.rebalances + 1,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionSeries {
    pub initial: f64,
    pub values: Vec<f64>,
    pub rebalances: usize,
}

impl PositionSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Position held going into period `t` (the initial position for t = 0).
    pub fn previous(&self, t: usize) -> f64 {
        if t == 0 {
            self.initial
        } else {
            self.values[t - 1]
        }
    }

    /// |position[t] − position[t-1]| for every period.
    pub fn changes(&self) -> Vec<f64> {
        (0..self.values.len())
            .map(|t| (self.values[t] - self.previous(t)).abs())
            .collect()
    }

    pub fn constant(value: f64, len: usize) -> Self {
        Self {
            initial: value,
            values: vec![value; len],
            rebalances: 0,
        }
    }
}

pub fn constrain(raw_targets: &[Option<f64>], params: &ConstraintParams) -> PositionSeries {
    let mut state = ConstraintState::new(params.prior_position);
    let values = raw_targets
        .iter()
        .enumerate()
        .map(|(t, &raw)| {
            state = state.step(t, raw, params);
            state.held
        })
        .collect();

    PositionSeries {
        initial: params.prior_position,
        values,
        rebalances: state.rebalances,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ConstraintParams {
        ConstraintParams {
            prior_position: 0.0,
            leverage_cap: 2.0,
            turnover_threshold: 0.0,
            long_only: true,
            min_history: 0,
            undefined_policy: UndefinedPolicy::Flat,
        }
    }

    #[test]
    fn clips_to_cap() {
        let p = constrain(&[Some(5.0), Some(1.5)], &params());
        assert_eq!(p.values, vec![2.0, 1.5]);
    }

    #[test]
    fn long_only_clips_negative_to_zero() {
        let p = constrain(&[Some(-1.0)], &params());
        assert_eq!(p.values, vec![0.0]);
    }

    #[test]
    fn symmetric_cap_allows_short() {
        let p = constrain(
            &[Some(-5.0), Some(-0.5)],
            &ConstraintParams {
                long_only: false,
                ..params()
            },
        );
        assert_eq!(p.values, vec![-2.0, -0.5]);
    }

    #[test]
    fn flat_policy_goes_flat_on_undefined() {
        let p = constrain(&[Some(1.0), None, Some(1.2)], &params());
        assert_eq!(p.values, vec![1.0, 0.0, 1.2]);
        assert_eq!(p.rebalances, 3);
    }

    #[test]
    fn hold_policy_keeps_prior_on_undefined() {
        let p = constrain(
            &[None, Some(1.0), None, None],
            &ConstraintParams {
                undefined_policy: UndefinedPolicy::Hold,
                prior_position: 0.5,
                ..params()
            },
        );
        assert_eq!(p.values, vec![0.5, 1.0, 1.0, 1.0]);
        assert_eq!(p.rebalances, 1);
    }

    #[test]
    fn threshold_compares_against_held_position() {
        // Raw drifts by 0.04 per step; each step alone is below the 0.1
        // threshold, but the cumulative drift from the held position is not.
        let raw: Vec<Option<f64>> = (0..6).map(|i| Some(1.0 + 0.04 * i as f64)).collect();
        let p = constrain(
            &raw,
            &ConstraintParams {
                turnover_threshold: 0.1,
                ..params()
            },
        );
        assert_eq!(p.values[0], 1.0);
        assert_eq!(p.values[1], 1.0);
        assert_eq!(p.values[2], 1.0);
        assert!((p.values[3] - 1.12).abs() < 1e-12);
        assert!((p.values[4] - 1.12).abs() < 1e-12);
        assert!((p.values[5] - 1.12).abs() < 1e-12);
        assert_eq!(p.rebalances, 2);
    }

    #[test]
    fn infinite_threshold_never_trades() {
        let p = constrain(
            &[Some(1.0), None, Some(0.2)],
            &ConstraintParams {
                turnover_threshold: f64::INFINITY,
                prior_position: 0.7,
                ..params()
            },
        );
        assert_eq!(p.values, vec![0.7, 0.7, 0.7]);
        assert_eq!(p.rebalances, 0);
    }

    #[test]
    fn min_history_gates_targets() {
        let p = constrain(
            &[Some(1.0), Some(1.0), Some(1.0), Some(1.0)],
            &ConstraintParams {
                min_history: 3,
                ..params()
            },
        );
        assert_eq!(p.values, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn changes_include_initial_trade() {
        let p = constrain(
            &[Some(1.0), Some(1.5)],
            &ConstraintParams {
                prior_position: 0.25,
                ..params()
            },
        );
        let changes = p.changes();
        assert!((changes[0] - 0.75).abs() < 1e-12);
        assert!((changes[1] - 0.5).abs() < 1e-12);
        assert_eq!(p.previous(0), 0.25);
        assert_eq!(p.previous(1), 1.0);
    }

    #[test]
    fn policy_parses() {
        assert_eq!("Hold".parse::<UndefinedPolicy>().unwrap(), UndefinedPolicy::Hold);
        assert_eq!("flat".parse::<UndefinedPolicy>().unwrap(), UndefinedPolicy::Flat);
        assert!("zero".parse::<UndefinedPolicy>().is_err());
    }
}
