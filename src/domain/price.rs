//! Price and return series.
//!
//! A [`PriceSeries`] is validated once on construction (strictly increasing
//! dates, finite positive prices) and never mutated afterwards. A
//! [`ReturnSeries`] is derived from it and is one element shorter: return `i`
//! is dated at price `i + 1`.

use crate::domain::error::VoltargetError;
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, VoltargetError> {
        for (i, p) in points.iter().enumerate() {
            if !p.price.is_finite() || p.price <= 0.0 {
                return Err(VoltargetError::InvalidSeries {
                    reason: format!("price on {} must be finite and positive, got {}", p.date, p.price),
                });
            }
            if i > 0 && points[i - 1].date >= p.date {
                return Err(VoltargetError::InvalidSeries {
                    reason: format!(
                        "dates must be strictly increasing ({} followed by {})",
                        points[i - 1].date, p.date
                    ),
                });
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.price)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnKind {
    #[default]
    Simple,
    Log,
}

impl fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnKind::Simple => write!(f, "simple"),
            ReturnKind::Log => write!(f, "log"),
        }
    }
}

impl FromStr for ReturnKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(ReturnKind::Simple),
            "log" => Ok(ReturnKind::Log),
            other => Err(format!("unknown return kind '{}', expected simple or log", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    pub kind: ReturnKind,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl ReturnSeries {
    pub fn from_prices(prices: &PriceSeries, kind: ReturnKind) -> Self {
        let points = prices.points();
        let mut dates = Vec::with_capacity(points.len().saturating_sub(1));
        let mut values = Vec::with_capacity(points.len().saturating_sub(1));

        for w in points.windows(2) {
            let ratio = w[1].price / w[0].price;
            let r = match kind {
                ReturnKind::Simple => ratio - 1.0,
                ReturnKind::Log => ratio.ln(),
            };
            dates.push(w[1].date);
            values.push(r);
        }

        Self { kind, dates, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Return at `t` expressed as a simple (arithmetic) return.
    pub fn simple(&self, t: usize) -> f64 {
        match self.kind {
            ReturnKind::Simple => self.values[t],
            ReturnKind::Log => self.values[t].exp_m1(),
        }
    }
}
