//! Backtest simulator.
//!
//! A pure fold over the return series. The position applied to return `t` is
//! the one decided at the close of `t - 1`:
//!
//! gross[t] = position[t-1] · r[t]
//! carry[t] = (1 − position[t-1]) · cash_rate / periods_per_year
//! cost[t]  = cost_rate · |position[t] − position[t-1]|
//! NAV[t+1] = NAV[t] · (1 + gross[t] + carry[t] − cost[t]),  NAV[0] = 1

use crate::domain::constraint::PositionSeries;
use crate::domain::error::VoltargetError;
use crate::domain::price::ReturnSeries;

pub const BPS: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    /// Cost per unit of exposure traded, as a fraction (1 bp = 0.0001).
    pub cost_rate: f64,
    /// Annual rate earned on cash (paid on borrowing).
    pub cash_rate: f64,
    pub periods_per_year: u32,
}

impl CostModel {
    pub fn from_bps(cost_rate_bps: f64, cash_rate: f64, periods_per_year: u32) -> Self {
        Self {
            cost_rate: cost_rate_bps / BPS,
            cash_rate,
            periods_per_year,
        }
    }

    pub fn cash_per_period(&self) -> f64 {
        if self.periods_per_year == 0 {
            0.0
        } else {
            self.cash_rate / self.periods_per_year as f64
        }
    }

    pub fn with_cost_bps(self, cost_rate_bps: f64) -> Self {
        Self {
            cost_rate: cost_rate_bps / BPS,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// NAV per price date, starting at 1.0; one longer than the returns.
    pub equity: Vec<f64>,
    pub costs: Vec<f64>,
    pub gross_returns: Vec<f64>,
    pub net_returns: Vec<f64>,
}

impl SimulationResult {
    pub fn final_nav(&self) -> f64 {
        self.equity.last().copied().unwrap_or(1.0)
    }

    pub fn total_cost(&self) -> f64 {
        self.costs.iter().sum()
    }
}

pub fn simulate(
    returns: &ReturnSeries,
    positions: &PositionSeries,
    costs: &CostModel,
) -> Result<SimulationResult, VoltargetError> {
    if returns.len() != positions.len() {
        return Err(VoltargetError::InvalidSeries {
            reason: format!(
                "{} returns but {} positions",
                returns.len(),
                positions.len()
            ),
        });
    }
    let n = returns.len();
    let cash = costs.cash_per_period();

    let mut equity = Vec::with_capacity(n + 1);
    let mut cost_series = Vec::with_capacity(n);
    let mut gross_returns = Vec::with_capacity(n);
    let mut net_returns = Vec::with_capacity(n);

    let mut nav = 1.0;
    equity.push(nav);

    for t in 0..n {
        let prev = positions.previous(t);
        let gross = prev * returns.simple(t);
        let carry = (1.0 - prev) * cash;
        let cost = costs.cost_rate * (positions.values[t] - prev).abs();
        let net = gross + carry - cost;

        nav *= 1.0 + net;

        gross_returns.push(gross);
        cost_series.push(cost);
        net_returns.push(net);
        equity.push(nav);
    }

    Ok(SimulationResult {
        equity,
        costs: cost_series,
        gross_returns,
        net_returns,
    })
}
