//! CSV report adapter implementing ReportPort.
//!
//! Writes three files next to each other: the per-period table at the
//! requested path, plus `<stem>_summary.csv` and `<stem>_costs.csv`.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::VoltargetError;
use crate::domain::metrics::SummaryStats;
use crate::ports::report_port::ReportPort;
use std::path::{Path, PathBuf};

const PERIOD_HEADER: [&str; 10] = [
    "date",
    "price",
    "return",
    "volatility",
    "raw_target",
    "position",
    "cost",
    "net_return",
    "nav",
    "buy_hold_nav",
];

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn summary_path(output_path: &Path) -> PathBuf {
        sibling(output_path, "summary")
    }

    pub fn costs_path(output_path: &Path) -> PathBuf {
        sibling(output_path, "costs")
    }

    fn write_periods(result: &BacktestResult, path: &Path) -> Result<(), VoltargetError> {
        let mut wtr = writer(path)?;
        wtr.write_record(PERIOD_HEADER).map_err(csv_error)?;

        let points = result.prices.points();
        let equity = &result.simulation.equity;
        let bh_equity = &result.buy_and_hold.simulation.equity;

        if let Some(first) = points.first() {
            wtr.write_record([
                first.date.to_string(),
                first.price.to_string(),
                String::new(),
                String::new(),
                String::new(),
                result.positions.initial.to_string(),
                String::new(),
                String::new(),
                equity[0].to_string(),
                bh_equity[0].to_string(),
            ])
            .map_err(csv_error)?;
        }

        for t in 0..result.returns.len() {
            wtr.write_record([
                result.returns.dates[t].to_string(),
                points[t + 1].price.to_string(),
                result.returns.values[t].to_string(),
                cell(result.volatility.values[t]),
                cell(result.raw_targets[t]),
                result.positions.values[t].to_string(),
                result.simulation.costs[t].to_string(),
                result.simulation.net_returns[t].to_string(),
                equity[t + 1].to_string(),
                bh_equity[t + 1].to_string(),
            ])
            .map_err(csv_error)?;
        }

        wtr.flush()?;
        Ok(())
    }

    fn write_summary(result: &BacktestResult, path: &Path) -> Result<(), VoltargetError> {
        let mut wtr = writer(path)?;
        wtr.write_record(["metric", "strategy", "buy_hold", "vol_matched"])
            .map_err(csv_error)?;

        let columns = [
            &result.summary,
            &result.buy_and_hold.summary,
            &result.vol_matched.summary,
        ];
        for (name, values) in summary_rows(&columns) {
            let mut record = vec![name.to_string()];
            record.extend(values);
            wtr.write_record(&record).map_err(csv_error)?;
        }
        wtr.write_record([
            "weight".to_string(),
            String::new(),
            result.buy_and_hold.weight.to_string(),
            result.vol_matched.weight.to_string(),
        ])
        .map_err(csv_error)?;

        wtr.flush()?;
        Ok(())
    }

    fn write_costs(result: &BacktestResult, path: &Path) -> Result<(), VoltargetError> {
        let mut wtr = writer(path)?;
        wtr.write_record([
            "cost_rate_bps",
            "total_return",
            "cagr",
            "sharpe",
            "max_drawdown",
            "total_cost",
        ])
        .map_err(csv_error)?;

        for row in &result.cost_sensitivity {
            let s = &row.summary;
            wtr.write_record([
                row.cost_rate_bps.to_string(),
                s.total_return.to_string(),
                s.cagr.to_string(),
                cell(s.sharpe),
                s.max_drawdown.to_string(),
                s.total_cost.to_string(),
            ])
            .map_err(csv_error)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), VoltargetError> {
        Self::write_periods(result, output_path)?;
        Self::write_summary(result, &Self::summary_path(output_path))?;
        Self::write_costs(result, &Self::costs_path(output_path))?;
        log::debug!("report written to {}", output_path.display());
        Ok(())
    }
}

fn summary_rows(columns: &[&SummaryStats; 3]) -> Vec<(&'static str, Vec<String>)> {
    let row = |f: fn(&SummaryStats) -> String| -> Vec<String> {
        columns.iter().map(|s| f(s)).collect()
    };
    vec![
        ("periods", row(|s| s.periods.to_string())),
        ("total_return", row(|s| s.total_return.to_string())),
        ("cagr", row(|s| s.cagr.to_string())),
        (
            "annualized_volatility",
            row(|s| s.annualized_volatility.to_string()),
        ),
        ("sharpe", row(|s| cell(s.sharpe))),
        ("sortino", row(|s| cell(s.sortino))),
        ("max_drawdown", row(|s| s.max_drawdown.to_string())),
        (
            "max_drawdown_duration",
            row(|s| s.max_drawdown_duration.to_string()),
        ),
        ("calmar", row(|s| cell(s.calmar))),
        ("turnover", row(|s| s.turnover.to_string())),
        (
            "annualized_turnover",
            row(|s| s.annualized_turnover.to_string()),
        ),
        ("total_cost", row(|s| s.total_cost.to_string())),
        ("rebalances", row(|s| s.rebalances.to_string())),
        ("average_exposure", row(|s| s.average_exposure.to_string())),
    ]
}

/// Undefined values become empty cells.
fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn sibling(output_path: &Path, suffix: &str) -> PathBuf {
    let stem = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    output_path.with_file_name(format!("{}_{}.csv", stem, suffix))
}

fn writer(path: &Path) -> Result<csv::Writer<std::fs::File>, VoltargetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    csv::Writer::from_path(path).map_err(csv_error)
}

fn csv_error(e: csv::Error) -> VoltargetError {
    VoltargetError::Data {
        reason: format!("CSV write error: {}", e),
    }
}
