//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvPriceAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, target_vol_sweep, BacktestResult};
use crate::domain::config::VolTargetConfig;
use crate::domain::config_validation::{
    build_config, parse_delimiter, parse_number_list, validate_data_config,
};
use crate::domain::error::VoltargetError;
use crate::domain::metrics::SummaryStats;
use crate::domain::price::PriceSeries;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "voltarget", about = "Volatility-targeting backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run the backtest once per target volatility
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated annualized targets, e.g. 0.1,0.2,0.3
        #[arg(long)]
        target_vols: String,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data_dir,
            symbol,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, data_dir.as_ref(), symbol.as_deref())
            } else {
                run_backtest(
                    &config,
                    data_dir.as_ref(),
                    symbol.as_deref(),
                    output.as_ref(),
                )
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Sweep {
            config,
            target_vols,
            data_dir,
            symbol,
        } => run_sweep(&config, &target_vols, data_dir.as_ref(), symbol.as_deref()),
        Command::Info {
            config,
            symbol,
            data_dir,
        } => run_info(&config, symbol.as_deref(), data_dir.as_ref()),
    }
}

fn fail(err: VoltargetError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        fail(VoltargetError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    })
}

/// Loads, validates and assembles the strategy parameters.
fn load_strategy(path: &PathBuf) -> Result<(FileConfigAdapter, VolTargetConfig), ExitCode> {
    eprintln!("Loading config from {}", path.display());
    let adapter = load_config(path)?;
    let config = build_config(&adapter).map_err(fail)?;
    Ok((adapter, config))
}

/// Builds the CSV price adapter from the `[data]` section.
pub fn build_data_adapter(
    config: &dyn ConfigPort,
    data_dir_override: Option<&PathBuf>,
) -> Result<CsvPriceAdapter, VoltargetError> {
    let dir = match data_dir_override {
        Some(d) => d.clone(),
        None => config
            .get_string("data", "dir")
            .filter(|s| !s.trim().is_empty())
            .map(|s| PathBuf::from(s.trim()))
            .ok_or_else(|| VoltargetError::ConfigMissing {
                section: "data".into(),
                key: "dir".into(),
            })?,
    };

    let mut adapter = CsvPriceAdapter::new(dir);

    if let Some(raw) = config.get_string("data", "delimiter") {
        let delimiter = parse_delimiter(&raw).ok_or_else(|| {
            VoltargetError::invalid("data", "delimiter", format!("unsupported delimiter '{}'", raw))
        })?;
        adapter = adapter.with_delimiter(delimiter);
    }
    if let Some(fmt) = config
        .get_string("data", "date_format")
        .filter(|s| !s.trim().is_empty())
    {
        adapter = adapter.with_date_format(fmt.trim());
    }
    if let Some(cols) = config.get_string("data", "value_columns") {
        adapter = adapter.with_value_columns(
            cols.split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        );
    }

    Ok(adapter)
}

/// Optional `[data] start_date` / `end_date`, as YYYY-MM-DD.
pub fn read_date_range(
    config: &dyn ConfigPort,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), VoltargetError> {
    let read = |key: &str| -> Result<Option<NaiveDate>, VoltargetError> {
        match config.get_string("data", key) {
            None => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(Some)
                .map_err(|_| {
                    VoltargetError::invalid("data", key, "invalid date format (expected YYYY-MM-DD)")
                }),
        }
    };

    let start = read("start_date")?;
    let end = read("end_date")?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(VoltargetError::invalid(
                "data",
                "end_date",
                "end_date must not be before start_date",
            ));
        }
    }
    Ok((start, end))
}

pub fn resolve_symbol(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, VoltargetError> {
    if let Some(s) = symbol_override.map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(s.to_string());
    }
    config
        .get_string("data", "symbol")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| VoltargetError::ConfigMissing {
            section: "data".into(),
            key: "symbol".into(),
        })
}

fn run_backtest(
    config_path: &PathBuf,
    data_dir: Option<&PathBuf>,
    symbol_override: Option<&str>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load and validate config
    let (adapter, config) = match load_strategy(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    // Stage 2: Resolve data source
    let symbol = match resolve_symbol(symbol_override, &adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let data_port = match build_data_adapter(&adapter, data_dir) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };
    let (start, end) = match read_date_range(&adapter) {
        Ok(range) => range,
        Err(e) => return fail(e),
    };

    let output = output_path
        .cloned()
        .unwrap_or_else(|| PathBuf::from(format!("{}_backtest.csv", symbol.to_lowercase())));

    // Stages 3-6: Data port dependent pipeline
    run_backtest_pipeline(
        &data_port,
        &CsvReportAdapter::new(),
        &config,
        &symbol,
        (start, end),
        &output,
    )
}

/// Loads the VIX gate's levels when the gate is enabled. Earlier history is
/// kept so the first traded period already has a level to carry forward.
pub fn fetch_gate_levels(
    data_port: &dyn DataPort,
    config: &VolTargetConfig,
    end: Option<NaiveDate>,
) -> Result<Option<PriceSeries>, VoltargetError> {
    let Some(gate) = &config.vix_gate else {
        return Ok(None);
    };
    let levels = data_port.fetch_prices(&gate.symbol, None, end)?;
    log::debug!("loaded {} {} levels for the gate", levels.len(), gate.symbol);
    Ok(Some(levels))
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    config: &VolTargetConfig,
    symbol: &str,
    (start, end): (Option<NaiveDate>, Option<NaiveDate>),
    output_path: &Path,
) -> ExitCode {
    // Stage 3: Fetch prices
    let prices = match data_port.fetch_prices(symbol, start, end) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    if let (Some(first), Some(last)) = (prices.first_date(), prices.last_date()) {
        eprintln!(
            "Loaded {} prices for {}: {} to {}",
            prices.len(),
            symbol,
            first,
            last
        );
    }

    let gate_levels = match fetch_gate_levels(data_port, config, end) {
        Ok(levels) => levels,
        Err(e) => return fail(e),
    };

    // Stage 4: Run backtest
    eprintln!(
        "Running backtest: {}, target vol {:.1}%, cap {:.2}",
        config.method,
        config.target_vol * 100.0,
        config.leverage_cap
    );
    let result =
        match backtest_engine::run_gated_backtest(&prices, gate_levels.as_ref(), config) {
            Ok(r) => r,
            Err(e) => return fail(e),
        };

    // Stage 5: Print console summary to stderr
    print_summary(&result);

    // Stage 6: Write report
    match report_port.write(&result, output_path) {
        Ok(()) => {
            eprintln!("\nReport written to: {}", output_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn fmt_ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

fn print_stats_line(label: &str, s: &SummaryStats) {
    eprintln!(
        "{:<14} {:>9.2}% {:>9.2}% {:>8} {:>9.1}% {:>8}",
        label,
        s.cagr * 100.0,
        s.annualized_volatility * 100.0,
        fmt_ratio(s.sharpe),
        s.max_drawdown * 100.0,
        fmt_ratio(s.calmar),
    );
}

pub fn print_summary(result: &BacktestResult) {
    let s = &result.summary;

    eprintln!("\n=== Strategy ===");
    eprintln!("Periods:          {}", s.periods);
    eprintln!("Total Return:     {:.2}%", s.total_return * 100.0);
    eprintln!("CAGR:             {:.2}%", s.cagr * 100.0);
    eprintln!("Volatility:       {:.2}%", s.annualized_volatility * 100.0);
    eprintln!("Sharpe Ratio:     {}", fmt_ratio(s.sharpe));
    eprintln!("Sortino Ratio:    {}", fmt_ratio(s.sortino));
    eprintln!(
        "Max Drawdown:     -{:.1}% ({} periods)",
        s.max_drawdown * 100.0,
        s.max_drawdown_duration
    );
    eprintln!("Calmar Ratio:     {}", fmt_ratio(s.calmar));
    eprintln!("Avg Exposure:     {:.2}", s.average_exposure);
    eprintln!(
        "Turnover:         {:.2} ({:.2}/yr)",
        s.turnover, s.annualized_turnover
    );
    eprintln!("Rebalances:       {}", s.rebalances);
    eprintln!("Total Cost:       {:.4}", s.total_cost);

    eprintln!("\n=== Comparison ===");
    eprintln!(
        "{:<14} {:>10} {:>10} {:>8} {:>10} {:>8}",
        "", "CAGR", "Vol", "Sharpe", "MaxDD", "Calmar"
    );
    print_stats_line("strategy", s);
    print_stats_line("buy & hold", &result.buy_and_hold.summary);
    print_stats_line(
        &format!("vol-matched x{:.2}", result.vol_matched.weight),
        &result.vol_matched.summary,
    );

    if !result.cost_sensitivity.is_empty() {
        eprintln!("\n=== Cost Sensitivity ===");
        for row in &result.cost_sensitivity {
            eprintln!(
                "  {:>6.1} bps:  CAGR {:.2}%, Sharpe {}",
                row.cost_rate_bps,
                row.summary.cagr * 100.0,
                fmt_ratio(row.summary.sharpe),
            );
        }
    }
}

pub fn run_dry_run(
    config_path: &PathBuf,
    data_dir: Option<&PathBuf>,
    symbol_override: Option<&str>,
) -> ExitCode {
    let (adapter, config) = match load_strategy(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    eprintln!("Config validated successfully");

    print_config(&config);

    let symbol = match resolve_symbol(symbol_override, &adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let data_port = match build_data_adapter(&adapter, data_dir) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };
    if let Err(e) = read_date_range(&adapter) {
        return fail(e);
    }

    eprintln!("\nData:");
    match data_port.get_data_range(&symbol) {
        Ok(Some((first, last, count))) => {
            eprintln!("  {}: {} rows, {} to {}", symbol, count, first, last);
            let need = config.required_history() + 1;
            if count < need {
                eprintln!("  warning: at least {} rows are needed", need);
            }
        }
        Ok(None) => eprintln!("  {}: no data found", symbol),
        Err(e) => return fail(e),
    }
    if let Some(gate) = &config.vix_gate {
        match data_port.get_data_range(&gate.symbol) {
            Ok(Some((first, last, count))) => {
                eprintln!("  {}: {} rows, {} to {}", gate.symbol, count, first, last);
            }
            Ok(None) => eprintln!("  {}: no data found", gate.symbol),
            Err(e) => return fail(e),
        }
    }

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn print_config(config: &VolTargetConfig) {
    eprintln!("\nEstimator:");
    eprintln!("  method:         {}", config.method);
    eprintln!("  returns:        {}", config.return_kind);
    eprintln!("  annualization:  {}", config.annualization_factor);
    eprintln!("\nSizing:");
    eprintln!("  target vol:     {:.2}%", config.target_vol * 100.0);
    eprintln!("  leverage cap:   {}", config.leverage_cap);
    eprintln!("  threshold:      {}", config.turnover_threshold);
    eprintln!("  long only:      {}", config.long_only);
    eprintln!("  undefined:      {}", config.undefined_policy);
    eprintln!("  min history:    {}", config.min_history);
    if config.trend_window > 0 {
        eprintln!(
            "  trend filter:   SMA({}) band {}",
            config.trend_window, config.trend_band
        );
    }
    if let Some(gate) = &config.vix_gate {
        eprintln!(
            "  vix gate:       {} cut {} width {}",
            gate.symbol, gate.cut, gate.width
        );
    }
    eprintln!("\nCosts:");
    eprintln!("  cost:           {} bps", config.cost_rate_bps);
    eprintln!("  cash rate:      {}", config.cash_rate);
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let (adapter, config) = match load_strategy(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    if let Err(e) = validate_data_config(&adapter) {
        return fail(e);
    }
    if let Err(e) = read_date_range(&adapter) {
        return fail(e);
    }

    print_config(&config);
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_sweep(
    config_path: &PathBuf,
    target_vols: &str,
    data_dir: Option<&PathBuf>,
    symbol_override: Option<&str>,
) -> ExitCode {
    let targets = match parse_number_list(target_vols) {
        Ok(t) if !t.is_empty() => t,
        Ok(_) => {
            eprintln!("error: --target-vols is empty");
            return ExitCode::from(2);
        }
        Err(reason) => {
            eprintln!("error: invalid --target-vols: {reason}");
            return ExitCode::from(2);
        }
    };

    let (adapter, config) = match load_strategy(config_path) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };
    let symbol = match resolve_symbol(symbol_override, &adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let data_port = match build_data_adapter(&adapter, data_dir) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };
    let (start, end) = match read_date_range(&adapter) {
        Ok(range) => range,
        Err(e) => return fail(e),
    };

    let prices = match data_port.fetch_prices(&symbol, start, end) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let gate_levels = match fetch_gate_levels(&data_port, &config, end) {
        Ok(levels) => levels,
        Err(e) => return fail(e),
    };

    eprintln!(
        "Sweeping {} targets for {} ({} prices)",
        targets.len(),
        symbol,
        prices.len()
    );
    let rows = match target_vol_sweep(&prices, gate_levels.as_ref(), &config, &targets) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    println!("target_vol,cagr,volatility,sharpe,max_drawdown,average_exposure,turnover");
    for row in &rows {
        let s = &row.summary;
        println!(
            "{},{:.6},{:.6},{},{:.6},{:.6},{:.6}",
            row.target_vol,
            s.cagr,
            s.annualized_volatility,
            s.sharpe.map(|v| format!("{:.6}", v)).unwrap_or_default(),
            s.max_drawdown,
            s.average_exposure,
            s.turnover,
        );
    }
    ExitCode::SUCCESS
}

fn run_info(
    config_path: &PathBuf,
    symbol_override: Option<&str>,
    data_dir: Option<&PathBuf>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data_port = match build_data_adapter(&config, data_dir) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };

    let symbols = match resolve_symbol(symbol_override, &config) {
        Ok(s) => vec![s],
        Err(_) => match data_port.list_symbols() {
            Ok(s) => s,
            Err(e) => return fail(e),
        },
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    }
    for symbol in &symbols {
        match data_port.get_data_range(symbol) {
            Ok(Some((min_date, max_date, count))) => {
                println!("{}: {} rows, {} to {}", symbol, count, min_date, max_date);
            }
            Ok(None) => {
                eprintln!("{}: no data found", symbol);
            }
            Err(e) => {
                eprintln!("error querying {}: {}", symbol, e);
            }
        }
    }
    ExitCode::SUCCESS
}
