//! Performance diagnostics computed from a simulation.

use super::constraint::PositionSeries;
use super::error::VoltargetError;
use super::price::ReturnSeries;
use super::simulation::{simulate, CostModel, SimulationResult};

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStats {
    pub periods: usize,
    pub total_return: f64,
    pub cagr: f64,
    pub annualized_volatility: f64,
    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub calmar: Option<f64>,
    pub turnover: f64,
    pub annualized_turnover: f64,
    pub total_cost: f64,
    pub rebalances: usize,
    pub average_exposure: f64,
}

impl SummaryStats {
    pub fn compute(
        sim: &SimulationResult,
        positions: &PositionSeries,
        costs: &CostModel,
    ) -> Self {
        let ppy = costs.periods_per_year as f64;
        let periods = sim.net_returns.len();
        let first = sim.equity.first().copied().unwrap_or(1.0);
        let last = sim.final_nav();

        let total_return = if first > 0.0 { last / first - 1.0 } else { 0.0 };

        let cagr = if periods > 0 && first > 0.0 && last > 0.0 {
            (last / first).powf(ppy / periods as f64) - 1.0
        } else if periods > 0 && last <= 0.0 {
            -1.0
        } else {
            0.0
        };

        let stddev = sample_stddev(&sim.net_returns);
        let annualized_volatility = stddev * ppy.sqrt();

        let rf = costs.cash_per_period();
        let (sharpe, sortino) = compute_risk_adjusted(&sim.net_returns, rf, ppy);

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&sim.equity);
        let calmar = if max_drawdown > 0.0 {
            Some(cagr / max_drawdown)
        } else {
            None
        };

        let changes = positions.changes();
        let turnover = mean(&changes);
        let held: Vec<f64> = (0..positions.len()).map(|t| positions.previous(t)).collect();

        SummaryStats {
            periods,
            total_return,
            cagr,
            annualized_volatility,
            sharpe,
            sortino,
            max_drawdown,
            max_drawdown_duration,
            calmar,
            turnover,
            annualized_turnover: turnover * ppy,
            total_cost: sim.total_cost(),
            rebalances: positions.rebalances,
            average_exposure: mean(&held.iter().map(|p| p.abs()).collect::<Vec<_>>()),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|r| (r - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Returns (max drawdown as a fraction of the running peak, longest run of
/// periods spent below a previous peak).
pub fn compute_drawdown(equity: &[f64]) -> (f64, usize) {
    let Some(&start) = equity.first() else {
        return (0.0, 0);
    };

    let mut peak = start;
    let mut max_dd = 0.0_f64;
    let mut current_duration = 0usize;
    let mut max_duration = 0usize;

    for &nav in equity {
        if nav >= peak {
            peak = nav;
            current_duration = 0;
        } else if peak > 0.0 {
            let dd = 1.0 - nav / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_duration += 1;
            max_duration = max_duration.max(current_duration);
        }
    }

    (max_dd, max_duration)
}

fn compute_risk_adjusted(returns: &[f64], rf: f64, ppy: f64) -> (Option<f64>, Option<f64>) {
    if returns.len() < 2 {
        return (None, None);
    }

    let excess: Vec<f64> = returns.iter().map(|r| r - rf).collect();
    let excess_mean = mean(&excess);
    let stddev = sample_stddev(returns);

    let sharpe = (stddev > 0.0).then(|| excess_mean * ppy / (stddev * ppy.sqrt()));

    let downside = excess
        .iter()
        .filter(|&&r| r < 0.0)
        .map(|r| r * r)
        .sum::<f64>()
        / returns.len() as f64;
    let downside_dev = downside.sqrt();
    let sortino = (downside_dev > 0.0).then(|| excess_mean * ppy / (downside_dev * ppy.sqrt()));

    (sharpe, sortino)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostSensitivityRow {
    pub cost_rate_bps: f64,
    pub summary: SummaryStats,
}

/// Re-runs the simulation at each cost rate. Positions do not depend on the
/// cost rate, so only the simulation is repeated.
pub fn cost_sensitivity(
    returns: &ReturnSeries,
    positions: &PositionSeries,
    base: &CostModel,
    cost_rates_bps: &[f64],
) -> Result<Vec<CostSensitivityRow>, VoltargetError> {
    cost_rates_bps
        .iter()
        .map(|&bps| {
            let model = base.with_cost_bps(bps);
            let sim = simulate(returns, positions, &model)?;
            Ok(CostSensitivityRow {
                cost_rate_bps: bps,
                summary: SummaryStats::compute(&sim, positions, &model),
            })
        })
        .collect()
}
