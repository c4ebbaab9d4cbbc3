//! Run configuration.
//!
//! Built once (from an INI file via `config_validation::build_config`, or
//! directly), validated, then only read.

use crate::domain::constraint::{ConstraintParams, UndefinedPolicy};
use crate::domain::error::VoltargetError;
use crate::domain::gate::VixGate;
use crate::domain::price::ReturnKind;
use crate::domain::simulation::CostModel;
use crate::domain::volatility::{EstimatorMethod, EwmaDecay, EwmaSeed};

pub const DEFAULT_COST_SWEEP_BPS: [f64; 5] = [0.0, 1.0, 5.0, 10.0, 25.0];

#[derive(Debug, Clone, PartialEq)]
pub struct VolTargetConfig {
    pub method: EstimatorMethod,
    pub return_kind: ReturnKind,
    pub annualization_factor: u32,
    pub target_vol: f64,
    pub leverage_cap: f64,
    pub turnover_threshold: f64,
    pub long_only: bool,
    pub undefined_policy: UndefinedPolicy,
    pub initial_position: f64,
    pub min_history: usize,
    /// SMA window of the trend filter; 0 disables it.
    pub trend_window: usize,
    pub trend_band: f64,
    /// Optional VIX gate; `None` runs ungated.
    pub vix_gate: Option<VixGate>,
    pub cost_rate_bps: f64,
    pub cash_rate: f64,
    pub cost_sweep_bps: Vec<f64>,
}

impl Default for VolTargetConfig {
    fn default() -> Self {
        Self {
            method: EstimatorMethod::Ewma {
                decay: EwmaDecay::Span(20),
                seed: EwmaSeed::FirstSquare,
            },
            return_kind: ReturnKind::Simple,
            annualization_factor: 252,
            target_vol: 0.40,
            leverage_cap: 1.3,
            turnover_threshold: 0.0,
            long_only: true,
            undefined_policy: UndefinedPolicy::Flat,
            initial_position: 0.0,
            min_history: 0,
            trend_window: 0,
            trend_band: -0.02,
            vix_gate: None,
            cost_rate_bps: 1.0,
            cash_rate: 0.0,
            cost_sweep_bps: DEFAULT_COST_SWEEP_BPS.to_vec(),
        }
    }
}

impl VolTargetConfig {
    pub fn validate(&self) -> Result<(), VoltargetError> {
        self.validate_estimator()?;
        self.validate_sizing()?;
        self.validate_costs()?;
        Ok(())
    }

    fn validate_estimator(&self) -> Result<(), VoltargetError> {
        if self.annualization_factor == 0 {
            return Err(VoltargetError::invalid(
                "estimator",
                "annualization_factor",
                "annualization_factor must be at least 1",
            ));
        }

        match self.method {
            EstimatorMethod::Rolling { window } => {
                if window < 2 {
                    return Err(VoltargetError::invalid(
                        "estimator",
                        "window",
                        "rolling window must be at least 2",
                    ));
                }
            }
            EstimatorMethod::Ewma { decay, seed } => {
                match decay {
                    EwmaDecay::HalfLife(h) if !(h.is_finite() && h > 0.0) => {
                        return Err(VoltargetError::invalid(
                            "estimator",
                            "halflife",
                            "halflife must be positive",
                        ));
                    }
                    EwmaDecay::Lambda(l) if !(l > 0.0 && l < 1.0) => {
                        return Err(VoltargetError::invalid(
                            "estimator",
                            "decay",
                            "decay must be between 0 and 1 (exclusive)",
                        ));
                    }
                    EwmaDecay::Span(n) if n < 1 => {
                        return Err(VoltargetError::invalid(
                            "estimator",
                            "window",
                            "ewma span must be at least 1",
                        ));
                    }
                    _ => {}
                }
                if let EwmaSeed::Rolling(w) = seed {
                    if w < 1 {
                        return Err(VoltargetError::invalid(
                            "estimator",
                            "window",
                            "ewma seed window must be at least 1",
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_sizing(&self) -> Result<(), VoltargetError> {
        if !(self.target_vol.is_finite() && self.target_vol > 0.0) {
            return Err(VoltargetError::invalid(
                "sizing",
                "target_vol",
                "target_vol must be positive",
            ));
        }
        if !(self.leverage_cap.is_finite() && self.leverage_cap > 0.0) {
            return Err(VoltargetError::invalid(
                "sizing",
                "leverage_cap",
                "leverage_cap must be positive",
            ));
        }
        if self.turnover_threshold.is_nan() || self.turnover_threshold < 0.0 {
            return Err(VoltargetError::invalid(
                "sizing",
                "turnover_threshold",
                "turnover_threshold must be non-negative",
            ));
        }
        let (lo, hi) = self.constraint_params().bounds();
        if !self.initial_position.is_finite()
            || self.initial_position < lo
            || self.initial_position > hi
        {
            return Err(VoltargetError::invalid(
                "sizing",
                "initial_position",
                format!("initial_position must be within [{}, {}]", lo, hi),
            ));
        }
        if !(self.trend_band.is_finite() && self.trend_band > -1.0) {
            return Err(VoltargetError::invalid(
                "sizing",
                "trend_band",
                "trend_band must be greater than -1",
            ));
        }
        if let Some(gate) = &self.vix_gate {
            if gate.symbol.trim().is_empty() {
                return Err(VoltargetError::invalid(
                    "sizing",
                    "vix_symbol",
                    "vix_symbol must not be empty",
                ));
            }
            if !gate.cut.is_finite() {
                return Err(VoltargetError::invalid(
                    "sizing",
                    "vix_cut",
                    "vix_cut must be a finite number",
                ));
            }
            if !(gate.width.is_finite() && gate.width > 0.0) {
                return Err(VoltargetError::invalid(
                    "sizing",
                    "vix_width",
                    "vix_width must be positive",
                ));
            }
        }
        Ok(())
    }

    fn validate_costs(&self) -> Result<(), VoltargetError> {
        if !(self.cost_rate_bps.is_finite() && self.cost_rate_bps >= 0.0) {
            return Err(VoltargetError::invalid(
                "backtest",
                "cost_rate_bps",
                "cost_rate_bps must be non-negative",
            ));
        }
        if !self.cash_rate.is_finite() || self.cash_rate <= -1.0 {
            return Err(VoltargetError::invalid(
                "backtest",
                "cash_rate",
                "cash_rate must be greater than -1",
            ));
        }
        if self
            .cost_sweep_bps
            .iter()
            .any(|bps| !(bps.is_finite() && *bps >= 0.0))
        {
            return Err(VoltargetError::invalid(
                "backtest",
                "cost_sweep_bps",
                "every cost_sweep_bps entry must be non-negative",
            ));
        }
        Ok(())
    }

    /// Returns needed before the strategy can act on a target.
    pub fn required_history(&self) -> usize {
        self.method.warmup().max(self.min_history)
    }

    pub fn constraint_params(&self) -> ConstraintParams {
        ConstraintParams {
            prior_position: self.initial_position,
            leverage_cap: self.leverage_cap,
            turnover_threshold: self.turnover_threshold,
            long_only: self.long_only,
            min_history: self.min_history,
            undefined_policy: self.undefined_policy,
        }
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel::from_bps(self.cost_rate_bps, self.cash_rate, self.annualization_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_of(err: VoltargetError) -> String {
        match err {
            VoltargetError::InvalidConfig { key, .. } => key,
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(VolTargetConfig::default().validate().is_ok());
    }

    #[test]
    fn leverage_cap_must_be_positive() {
        let config = VolTargetConfig {
            leverage_cap: 0.0,
            ..VolTargetConfig::default()
        };
        assert_eq!(key_of(config.validate().unwrap_err()), "leverage_cap");
    }

    #[test]
    fn negative_turnover_threshold_fails() {
        let config = VolTargetConfig {
            turnover_threshold: -0.1,
            ..VolTargetConfig::default()
        };
        assert_eq!(key_of(config.validate().unwrap_err()), "turnover_threshold");
    }

    #[test]
    fn infinite_turnover_threshold_is_allowed() {
        let config = VolTargetConfig {
            turnover_threshold: f64::INFINITY,
            ..VolTargetConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rolling_window_below_two_fails() {
        let config = VolTargetConfig {
            method: EstimatorMethod::Rolling { window: 1 },
            ..VolTargetConfig::default()
        };
        assert_eq!(key_of(config.validate().unwrap_err()), "window");
    }

    #[test]
    fn decay_out_of_range_fails() {
        let config = VolTargetConfig {
            method: EstimatorMethod::Ewma {
                decay: EwmaDecay::Lambda(1.0),
                seed: EwmaSeed::FirstSquare,
            },
            ..VolTargetConfig::default()
        };
        assert_eq!(key_of(config.validate().unwrap_err()), "decay");
    }

    #[test]
    fn halflife_must_be_positive() {
        let config = VolTargetConfig {
            method: EstimatorMethod::Ewma {
                decay: EwmaDecay::HalfLife(0.0),
                seed: EwmaSeed::FirstSquare,
            },
            ..VolTargetConfig::default()
        };
        assert_eq!(key_of(config.validate().unwrap_err()), "halflife");
    }

    #[test]
    fn target_vol_must_be_positive() {
        let config = VolTargetConfig {
            target_vol: -0.1,
            ..VolTargetConfig::default()
        };
        assert_eq!(key_of(config.validate().unwrap_err()), "target_vol");
    }

    #[test]
    fn initial_position_outside_bounds_fails() {
        let config = VolTargetConfig {
            initial_position: -0.5,
            long_only: true,
            ..VolTargetConfig::default()
        };
        assert_eq!(key_of(config.validate().unwrap_err()), "initial_position");

        let short_ok = VolTargetConfig {
            initial_position: -0.5,
            long_only: false,
            ..VolTargetConfig::default()
        };
        assert!(short_ok.validate().is_ok());
    }

    #[test]
    fn vix_gate_needs_positive_width() {
        let config = VolTargetConfig {
            vix_gate: Some(VixGate {
                width: 0.0,
                ..VixGate::new("VIX")
            }),
            ..VolTargetConfig::default()
        };
        assert_eq!(key_of(config.validate().unwrap_err()), "vix_width");

        let gated = VolTargetConfig {
            vix_gate: Some(VixGate::new("VIX")),
            ..VolTargetConfig::default()
        };
        assert!(gated.validate().is_ok());
    }

    #[test]
    fn negative_cost_fails() {
        let config = VolTargetConfig {
            cost_rate_bps: -1.0,
            ..VolTargetConfig::default()
        };
        assert_eq!(key_of(config.validate().unwrap_err()), "cost_rate_bps");

        let sweep = VolTargetConfig {
            cost_sweep_bps: vec![0.0, -5.0],
            ..VolTargetConfig::default()
        };
        assert_eq!(key_of(sweep.validate().unwrap_err()), "cost_sweep_bps");
    }

    #[test]
    fn zero_annualization_fails() {
        let config = VolTargetConfig {
            annualization_factor: 0,
            ..VolTargetConfig::default()
        };
        assert_eq!(key_of(config.validate().unwrap_err()), "annualization_factor");
    }

    #[test]
    fn required_history_takes_the_larger() {
        let config = VolTargetConfig {
            method: EstimatorMethod::Rolling { window: 20 },
            min_history: 60,
            ..VolTargetConfig::default()
        };
        assert_eq!(config.required_history(), 60);

        let config = VolTargetConfig {
            min_history: 5,
            ..config
        };
        assert_eq!(config.required_history(), 20);
    }

    #[test]
    fn cost_model_uses_bps() {
        let config = VolTargetConfig {
            cost_rate_bps: 10.0,
            ..VolTargetConfig::default()
        };
        let model = config.cost_model();
        assert!((model.cost_rate - 0.001).abs() < 1e-15);
        assert_eq!(model.periods_per_year, 252);
    }
}
