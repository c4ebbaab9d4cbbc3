//! Return volatility estimators.
//!
//! This module provides:
//! - `EstimatorMethod`: estimator identity + parameters (rolling window or EWMA)
//! - `VolatilityEstimate`: an annualized volatility series aligned to the returns
//! - `estimate`: dispatch to the concrete estimator
//!
//! Every estimator is causal: the value at `t` only reads returns `0..=t`.
//! Warm-up periods are `None`, never zero.

pub mod ewma;
pub mod rolling;

use crate::domain::error::VoltargetError;
use crate::domain::price::ReturnSeries;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EwmaDecay {
    /// Observations lose half their weight after this many periods.
    HalfLife(f64),
    /// Decay factor λ applied to the previous variance.
    Lambda(f64),
    /// Pandas-style span, λ = 1 − 2/(n+1).
    Span(usize),
}

impl EwmaDecay {
    pub fn lambda(&self) -> f64 {
        match *self {
            EwmaDecay::HalfLife(h) => 0.5_f64.powf(1.0 / h),
            EwmaDecay::Lambda(l) => l,
            EwmaDecay::Span(n) => 1.0 - 2.0 / (n as f64 + 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EwmaSeed {
    /// var[0] = r[0]²
    FirstSquare,
    /// var[w-1] = mean of the first w squared returns
    Rolling(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EstimatorMethod {
    Rolling { window: usize },
    Ewma { decay: EwmaDecay, seed: EwmaSeed },
}

impl EstimatorMethod {
    /// Number of returns needed before the first defined estimate.
    pub fn warmup(&self) -> usize {
        match self {
            EstimatorMethod::Rolling { window } => *window,
            EstimatorMethod::Ewma { seed, .. } => match seed {
                EwmaSeed::FirstSquare => 1,
                EwmaSeed::Rolling(w) => *w,
            },
        }
    }
}

impl fmt::Display for EstimatorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimatorMethod::Rolling { window } => write!(f, "ROLLING({})", window),
            EstimatorMethod::Ewma { decay, .. } => match decay {
                EwmaDecay::HalfLife(h) => write!(f, "EWMA(halflife={})", h),
                EwmaDecay::Lambda(l) => write!(f, "EWMA(lambda={})", l),
                EwmaDecay::Span(n) => write!(f, "EWMA(span={})", n),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityEstimate {
    pub method: EstimatorMethod,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<Option<f64>>,
}

impl VolatilityEstimate {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

pub fn estimate(
    returns: &ReturnSeries,
    method: EstimatorMethod,
    annualization_factor: u32,
) -> Result<VolatilityEstimate, VoltargetError> {
    let need = method.warmup();
    if returns.len() < need {
        return Err(VoltargetError::InsufficientHistory {
            have: returns.len(),
            need,
        });
    }

    let annualization = annualization_factor as f64;
    let values = match method {
        EstimatorMethod::Rolling { window } => {
            rolling::rolling_volatility(&returns.values, window, annualization)
        }
        EstimatorMethod::Ewma { decay, seed } => {
            ewma::ewma_volatility(&returns.values, decay.lambda(), seed, annualization)
        }
    };

    log::debug!(
        "{}: {} of {} periods defined",
        method,
        values.iter().filter(|v| v.is_some()).count(),
        values.len()
    );

    Ok(VolatilityEstimate {
        method,
        dates: returns.dates.clone(),
        values,
    })
}
