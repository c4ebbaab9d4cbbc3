//! Configuration validation.
//!
//! Reads every recognised key from a [`ConfigPort`], rejects values that do
//! not parse, and assembles a validated [`VolTargetConfig`].

use crate::domain::config::{VolTargetConfig, DEFAULT_COST_SWEEP_BPS};
use crate::domain::constraint::UndefinedPolicy;
use crate::domain::error::VoltargetError;
use crate::domain::gate::{VixGate, DEFAULT_VIX_CUT, DEFAULT_VIX_WIDTH};
use crate::domain::price::ReturnKind;
use crate::domain::volatility::{EstimatorMethod, EwmaDecay, EwmaSeed};
use crate::ports::config_port::ConfigPort;
use std::str::FromStr;

pub fn build_config(config: &dyn ConfigPort) -> Result<VolTargetConfig, VoltargetError> {
    let defaults = VolTargetConfig::default();

    let built = VolTargetConfig {
        method: read_method(config)?,
        return_kind: read_parsed(config, "estimator", "return_kind", ReturnKind::Simple)?,
        annualization_factor: u32::try_from(read_count(
            config,
            "estimator",
            "annualization_factor",
            252,
        )?)
        .map_err(|_| {
            VoltargetError::invalid("estimator", "annualization_factor", "value is too large")
        })?,
        target_vol: read_f64(config, "sizing", "target_vol", defaults.target_vol)?,
        leverage_cap: read_f64(config, "sizing", "leverage_cap", defaults.leverage_cap)?,
        turnover_threshold: read_f64(
            config,
            "sizing",
            "turnover_threshold",
            defaults.turnover_threshold,
        )?,
        long_only: read_bool(config, "sizing", "long_only", defaults.long_only)?,
        undefined_policy: read_parsed(
            config,
            "sizing",
            "undefined_policy",
            UndefinedPolicy::default(),
        )?,
        initial_position: read_f64(config, "sizing", "initial_position", 0.0)?,
        min_history: read_count(config, "sizing", "min_history", 0)?,
        trend_window: read_count(config, "sizing", "trend_window", 0)?,
        trend_band: read_f64(config, "sizing", "trend_band", defaults.trend_band)?,
        vix_gate: read_vix_gate(config)?,
        cost_rate_bps: read_f64(config, "backtest", "cost_rate_bps", defaults.cost_rate_bps)?,
        cash_rate: read_f64(config, "backtest", "cash_rate", 0.0)?,
        cost_sweep_bps: read_list(config, "backtest", "cost_sweep_bps")?
            .unwrap_or_else(|| DEFAULT_COST_SWEEP_BPS.to_vec()),
    };

    built.validate()?;
    Ok(built)
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), VoltargetError> {
    for key in ["dir", "symbol"] {
        match config.get_string("data", key) {
            Some(s) if !s.trim().is_empty() => {}
            _ => {
                return Err(VoltargetError::ConfigMissing {
                    section: "data".to_string(),
                    key: key.to_string(),
                });
            }
        }
    }
    if let Some(delim) = config.get_string("data", "delimiter") {
        if parse_delimiter(&delim).is_none() {
            return Err(VoltargetError::invalid(
                "data",
                "delimiter",
                "delimiter must be a single character or one of comma, semicolon, tab, pipe",
            ));
        }
    }
    Ok(())
}

/// Accepts a single ASCII character or a name; `;` cannot be written
/// literally in an INI value because it starts a comment.
pub fn parse_delimiter(raw: &str) -> Option<u8> {
    match raw.trim().to_lowercase().as_str() {
        "comma" => Some(b','),
        "semicolon" => Some(b';'),
        "tab" => Some(b'\t'),
        "pipe" => Some(b'|'),
        s if s.len() == 1 && s.is_ascii() => s.bytes().next(),
        _ => None,
    }
}

fn read_method(config: &dyn ConfigPort) -> Result<EstimatorMethod, VoltargetError> {
    let method = config
        .get_string("estimator", "method")
        .unwrap_or_else(|| "ewma".to_string());
    let window = read_count(config, "estimator", "window", 20)?;

    match method.trim().to_lowercase().as_str() {
        "rolling" => Ok(EstimatorMethod::Rolling { window }),
        "ewma" => {
            let decay = if config.has_key("estimator", "decay") {
                EwmaDecay::Lambda(read_f64(config, "estimator", "decay", 0.0)?)
            } else if config.has_key("estimator", "halflife") {
                EwmaDecay::HalfLife(read_f64(config, "estimator", "halflife", 0.0)?)
            } else {
                EwmaDecay::Span(window)
            };
            let seed = match config
                .get_string("estimator", "ewma_seed")
                .unwrap_or_else(|| "first".to_string())
                .trim()
                .to_lowercase()
                .as_str()
            {
                "first" => EwmaSeed::FirstSquare,
                "rolling" => EwmaSeed::Rolling(window),
                other => {
                    return Err(VoltargetError::invalid(
                        "estimator",
                        "ewma_seed",
                        format!("unknown seed '{}', expected first or rolling", other),
                    ));
                }
            };
            Ok(EstimatorMethod::Ewma { decay, seed })
        }
        other => Err(VoltargetError::invalid(
            "estimator",
            "method",
            format!("unknown method '{}', expected rolling or ewma", other),
        )),
    }
}

/// The gate is enabled by `[sizing] vix_symbol`; cut and width only apply
/// when it is set.
fn read_vix_gate(config: &dyn ConfigPort) -> Result<Option<VixGate>, VoltargetError> {
    let Some(symbol) = config
        .get_string("sizing", "vix_symbol")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    else {
        return Ok(None);
    };
    Ok(Some(VixGate {
        symbol,
        cut: read_f64(config, "sizing", "vix_cut", DEFAULT_VIX_CUT)?,
        width: read_f64(config, "sizing", "vix_width", DEFAULT_VIX_WIDTH)?,
    }))
}

fn read_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, VoltargetError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => parse_f64(raw.trim())
            .ok_or_else(|| VoltargetError::invalid(section, key, format!("'{}' is not a number", raw))),
    }
}

fn parse_f64(raw: &str) -> Option<f64> {
    match raw.to_lowercase().as_str() {
        "inf" | "infinity" | "+inf" => Some(f64::INFINITY),
        s => s.parse::<f64>().ok(),
    }
}

fn read_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, VoltargetError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => parse_bool(&raw).ok_or_else(|| {
            VoltargetError::invalid(
                section,
                key,
                format!("'{}' is not a boolean (true/false, yes/no, 1/0, on/off)", raw),
            )
        }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

fn read_count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, VoltargetError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => {
            let value: i64 = raw.trim().parse().map_err(|_| {
                VoltargetError::invalid(section, key, format!("'{}' is not an integer", raw))
            })?;
            if value < 0 {
                return Err(VoltargetError::invalid(
                    section,
                    key,
                    format!("{} must be non-negative", key),
                ));
            }
            Ok(value as usize)
        }
    }
}

fn read_parsed<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, VoltargetError>
where
    T: FromStr<Err = String>,
{
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|reason| VoltargetError::invalid(section, key, reason)),
    }
}

fn read_list(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<Vec<f64>>, VoltargetError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(None);
    };
    parse_number_list(&raw)
        .map(Some)
        .map_err(|reason| VoltargetError::invalid(section, key, reason))
}

/// Parses "0, 1.5,10" into numbers; empty tokens are rejected.
pub fn parse_number_list(raw: &str) -> Result<Vec<f64>, String> {
    raw.split(',')
        .map(|token| {
            let t = token.trim();
            if t.is_empty() {
                return Err("empty entry in list".to_string());
            }
            t.parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", t))
        })
        .collect()
}
