//! Backtest pipeline.
//!
//! prices → returns → volatility → raw target → (trend, VIX overlays) →
//! positions → simulation → diagnostics. Every run builds fresh series from
//! the config, the prices and the optional gating series alone.

use crate::domain::benchmark::{self, Benchmark};
use crate::domain::config::VolTargetConfig;
use crate::domain::constraint::{constrain, PositionSeries};
use crate::domain::error::VoltargetError;
use crate::domain::gate::apply_gate;
use crate::domain::leverage::raw_targets;
use crate::domain::metrics::{cost_sensitivity, CostSensitivityRow, SummaryStats};
use crate::domain::price::{PriceSeries, ReturnSeries};
use crate::domain::simulation::{simulate, SimulationResult};
use crate::domain::trend::{apply_trend_filter, trend_signal};
use crate::domain::volatility::{estimate, VolatilityEstimate};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub prices: PriceSeries,
    pub returns: ReturnSeries,
    pub volatility: VolatilityEstimate,
    pub raw_targets: Vec<Option<f64>>,
    /// VIX gate factor per period, when the gate is enabled.
    pub gate: Option<Vec<Option<f64>>>,
    pub positions: PositionSeries,
    pub simulation: SimulationResult,
    pub summary: SummaryStats,
    pub buy_and_hold: Benchmark,
    pub vol_matched: Benchmark,
    pub cost_sensitivity: Vec<CostSensitivityRow>,
}

pub fn run_backtest(
    prices: &PriceSeries,
    config: &VolTargetConfig,
) -> Result<BacktestResult, VoltargetError> {
    run_gated_backtest(prices, None, config)
}

/// Same as [`run_backtest`], with the levels of the VIX gate's symbol. The
/// levels are required when `config.vix_gate` is set and ignored otherwise.
pub fn run_gated_backtest(
    prices: &PriceSeries,
    gate_levels: Option<&PriceSeries>,
    config: &VolTargetConfig,
) -> Result<BacktestResult, VoltargetError> {
    config.validate()?;

    let returns = ReturnSeries::from_prices(prices, config.return_kind);
    let need = config.required_history();
    if returns.len() < need {
        return Err(VoltargetError::InsufficientHistory {
            have: returns.len(),
            need,
        });
    }

    let volatility = estimate(&returns, config.method, config.annualization_factor)?;

    let mut targets = raw_targets(&volatility, config.target_vol);
    if config.trend_window > 0 {
        let trend = trend_signal(prices, config.trend_window, config.trend_band);
        targets = apply_trend_filter(&targets, &trend);
    }

    let gate = match (&config.vix_gate, gate_levels) {
        (Some(vix), Some(levels)) => {
            let factors = vix.signal(levels, &returns.dates);
            targets = apply_gate(&targets, &factors, config.constraint_params().bounds());
            Some(factors)
        }
        (Some(vix), None) => {
            return Err(VoltargetError::NoData {
                symbol: vix.symbol.clone(),
            });
        }
        (None, _) => None,
    };

    let positions = constrain(&targets, &config.constraint_params());
    log::debug!(
        "sized {} periods, {} rebalances",
        positions.len(),
        positions.rebalances
    );

    let costs = config.cost_model();
    let simulation = simulate(&returns, &positions, &costs)?;
    let summary = SummaryStats::compute(&simulation, &positions, &costs);

    let buy_and_hold = benchmark::buy_and_hold(&returns, &costs)?;
    let vol_matched = benchmark::vol_matched(
        &returns,
        summary.annualized_volatility,
        buy_and_hold.summary.annualized_volatility,
        &costs,
    )?;

    let cost_sensitivity =
        cost_sensitivity(&returns, &positions, &costs, &config.cost_sweep_bps)?;

    log::debug!(
        "final NAV {:.4}, buy-and-hold NAV {:.4}",
        simulation.final_nav(),
        buy_and_hold.simulation.final_nav()
    );

    Ok(BacktestResult {
        prices: prices.clone(),
        returns,
        volatility,
        raw_targets: targets,
        gate,
        positions,
        simulation,
        summary,
        buy_and_hold,
        vol_matched,
        cost_sensitivity,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepRow {
    pub target_vol: f64,
    pub summary: SummaryStats,
}

/// Runs the full pipeline once per target volatility.
pub fn target_vol_sweep(
    prices: &PriceSeries,
    gate_levels: Option<&PriceSeries>,
    config: &VolTargetConfig,
    target_vols: &[f64],
) -> Result<Vec<SweepRow>, VoltargetError> {
    target_vols
        .iter()
        .map(|&target_vol| {
            let variant = VolTargetConfig {
                target_vol,
                ..config.clone()
            };
            run_gated_backtest(prices, gate_levels, &variant).map(|result| SweepRow {
                target_vol,
                summary: result.summary,
            })
        })
        .collect()
}
