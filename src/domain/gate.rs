//! VIX risk gate overlay.
//!
//! g[t] = clip(1 − (vix[t] − cut) / width, 0, 1), where vix[t] is the last
//! gating observation on or before the return date `t`. Full exposure at or
//! below the cut, none from `cut + width` upward. Periods before the first
//! observation have no gate value and get zero exposure.

use crate::domain::price::PriceSeries;
use chrono::NaiveDate;

pub const DEFAULT_VIX_CUT: f64 = 35.0;
pub const DEFAULT_VIX_WIDTH: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct VixGate {
    /// Symbol of the gating series, loaded through the same data port.
    pub symbol: String,
    pub cut: f64,
    pub width: f64,
}

impl VixGate {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            cut: DEFAULT_VIX_CUT,
            width: DEFAULT_VIX_WIDTH,
        }
    }

    pub fn factor(&self, level: f64) -> f64 {
        (1.0 - (level - self.cut) / self.width).clamp(0.0, 1.0)
    }

    /// Gate factor per return date.
    pub fn signal(&self, levels: &PriceSeries, dates: &[NaiveDate]) -> Vec<Option<f64>> {
        forward_fill(levels, dates)
            .into_iter()
            .map(|level| level.map(|v| self.factor(v)))
            .collect()
    }
}

/// Last value of `series` dated on or before each of `dates` (both ascending).
pub fn forward_fill(series: &PriceSeries, dates: &[NaiveDate]) -> Vec<Option<f64>> {
    let points = series.points();
    let mut next = 0;
    let mut last = None;

    dates
        .iter()
        .map(|date| {
            while next < points.len() && points[next].date <= *date {
                last = Some(points[next].price);
                next += 1;
            }
            last
        })
        .collect()
}

/// Scales each defined target, first clipped to `bounds`, by the gate factor.
/// Undefined targets stay undefined; a missing gate value zeroes the target.
pub fn apply_gate(
    raw: &[Option<f64>],
    gate: &[Option<f64>],
    (lo, hi): (f64, f64),
) -> Vec<Option<f64>> {
    raw.iter()
        .zip(gate)
        .map(|(target, g)| target.map(|t| t.clamp(lo, hi) * g.unwrap_or(0.0)))
        .collect()
}
