//! Buy-and-hold benchmarks.
//!
//! Both benchmarks hold a constant exposure from the first period, so they
//! never trade and pay no transaction cost.

use crate::domain::constraint::PositionSeries;
use crate::domain::error::VoltargetError;
use crate::domain::metrics::SummaryStats;
use crate::domain::price::ReturnSeries;
use crate::domain::simulation::{simulate, CostModel, SimulationResult};

pub const MAX_VOL_MATCHED_WEIGHT: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Benchmark {
    pub weight: f64,
    pub simulation: SimulationResult,
    pub summary: SummaryStats,
}

fn constant_exposure(
    returns: &ReturnSeries,
    weight: f64,
    costs: &CostModel,
) -> Result<Benchmark, VoltargetError> {
    let positions = PositionSeries::constant(weight, returns.len());
    let simulation = simulate(returns, &positions, costs)?;
    let summary = SummaryStats::compute(&simulation, &positions, costs);
    Ok(Benchmark {
        weight,
        simulation,
        summary,
    })
}

pub fn buy_and_hold(
    returns: &ReturnSeries,
    costs: &CostModel,
) -> Result<Benchmark, VoltargetError> {
    constant_exposure(returns, 1.0, costs)
}

/// Weight that scales buy-and-hold to the strategy's realized volatility.
pub fn vol_matched_weight(strategy_vol: f64, buy_hold_vol: f64) -> f64 {
    if buy_hold_vol > 0.0 {
        (strategy_vol / buy_hold_vol).clamp(0.0, MAX_VOL_MATCHED_WEIGHT)
    } else {
        1.0
    }
}

pub fn vol_matched(
    returns: &ReturnSeries,
    strategy_vol: f64,
    buy_hold_vol: f64,
    costs: &CostModel,
) -> Result<Benchmark, VoltargetError> {
    constant_exposure(returns, vol_matched_weight(strategy_vol, buy_hold_vol), costs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::ReturnKind;
    use chrono::NaiveDate;

    fn returns(values: &[f64]) -> ReturnSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        ReturnSeries {
            kind: ReturnKind::Simple,
            dates: (0..values.len())
                .map(|i| start + chrono::Duration::days(i as i64))
                .collect(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn buy_and_hold_compounds_every_return() {
        let costs = CostModel::from_bps(10.0, 0.0, 252);
        let bh = buy_and_hold(&returns(&[0.1, -0.1, 0.05]), &costs).unwrap();
        let expected = 1.1 * 0.9 * 1.05;
        assert!((bh.simulation.final_nav() - expected).abs() < 1e-12);
        assert!((bh.summary.total_cost - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn weight_is_clipped() {
        assert!((vol_matched_weight(0.1, 0.2) - 0.5).abs() < 1e-12);
        assert!((vol_matched_weight(1.0, 0.1) - 3.0).abs() < 1e-12);
        assert!((vol_matched_weight(0.1, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn vol_matched_scales_returns() {
        let costs = CostModel::from_bps(0.0, 0.0, 252);
        let vm = vol_matched(&returns(&[0.1]), 0.1, 0.2, &costs).unwrap();
        assert!((vm.weight - 0.5).abs() < 1e-12);
        assert!((vm.simulation.final_nav() - 1.05).abs() < 1e-12);
    }
}
