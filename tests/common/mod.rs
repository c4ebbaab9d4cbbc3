#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use voltarget::domain::error::VoltargetError;
pub use voltarget::domain::price::{PricePoint, PriceSeries, ReturnKind, ReturnSeries};
use voltarget::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_prices(mut self, symbol: &str, prices: PriceSeries) -> Self {
        self.data.insert(symbol.to_string(), prices);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, VoltargetError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(VoltargetError::Data {
                reason: reason.clone(),
            });
        }
        let series = self.data.get(symbol).ok_or_else(|| VoltargetError::NoData {
            symbol: symbol.to_string(),
        })?;
        let points: Vec<PricePoint> = series
            .points()
            .iter()
            .copied()
            .filter(|p| start_date.is_none_or(|s| p.date >= s))
            .filter(|p| end_date.is_none_or(|e| p.date <= e))
            .collect();
        PriceSeries::new(points)
    }

    fn list_symbols(&self) -> Result<Vec<String>, VoltargetError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, VoltargetError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(VoltargetError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).and_then(|s| {
            match (s.first_date(), s.last_date()) {
                (Some(first), Some(last)) => Some((first, last, s.len())),
                _ => None,
            }
        }))
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Daily-dated series starting 2020-01-01.
pub fn series_from_prices(prices: &[f64]) -> PriceSeries {
    let start = date(2020, 1, 1);
    PriceSeries::new(
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                price,
            })
            .collect(),
    )
    .unwrap()
}

/// Prices that reproduce the given simple returns exactly, starting at 100.
pub fn series_from_returns(returns: &[f64]) -> PriceSeries {
    let mut prices = Vec::with_capacity(returns.len() + 1);
    let mut p = 100.0;
    prices.push(p);
    for r in returns {
        p *= 1.0 + r;
        prices.push(p);
    }
    series_from_prices(&prices)
}

pub fn constant_prices(count: usize, price: f64) -> PriceSeries {
    series_from_prices(&vec![price; count])
}

/// Deterministic noisy random walk: alternating up/down moves of varying size.
pub fn generate_prices(count: usize, start_price: f64) -> PriceSeries {
    let mut p = start_price;
    let prices: Vec<f64> = (0..count)
        .map(|i| {
            let step = 0.004 + 0.003 * ((i * 7) % 5) as f64;
            p *= if i % 3 == 1 { 1.0 - step } else { 1.0 + step * 0.8 };
            p
        })
        .collect();
    series_from_prices(&prices)
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Writes `{dir}/{symbol}.csv` with `date,close` columns.
pub fn write_price_csv(dir: &Path, symbol: &str, series: &PriceSeries) {
    let mut content = String::from("date,close\n");
    for p in series.points() {
        content.push_str(&format!("{},{}\n", p.date.format("%Y-%m-%d"), p.price));
    }
    std::fs::write(dir.join(format!("{}.csv", symbol)), content).unwrap();
}

/// ExitCode has no stable equality, so compare debug renderings.
pub fn exit_code_is(actual: ExitCode, expected: u8) -> bool {
    format!("{actual:?}") == format!("{:?}", ExitCode::from(expected))
}
