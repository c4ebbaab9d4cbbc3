//! CSV file price adapter.
//!
//! One file per symbol, `{base_path}/{symbol}.csv`. The first column holds
//! the date; the price column is the first header that matches one of the
//! configured candidates.

use crate::domain::error::VoltargetError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

pub const DEFAULT_VALUE_COLUMNS: [&str; 6] =
    ["PX_LAST", "LAST", "Close", "close", "Adj Close", "adj_close"];

pub struct CsvPriceAdapter {
    base_path: PathBuf,
    delimiter: u8,
    date_formats: Vec<String>,
    value_columns: Vec<String>,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            delimiter: b',',
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
            value_columns: DEFAULT_VALUE_COLUMNS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Tried before the defaults.
    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_formats.insert(0, format.to_string());
        self
    }

    pub fn with_value_columns(mut self, columns: Vec<String>) -> Self {
        if !columns.is_empty() {
            self.value_columns = columns;
        }
        self
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        self.date_formats
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    }

    fn price_column(&self, headers: &csv::StringRecord) -> Option<usize> {
        self.value_columns.iter().find_map(|candidate| {
            headers
                .iter()
                .skip(1)
                .position(|h| h.trim() == candidate)
                .map(|i| i + 1)
        })
    }

    /// Reads every usable row, sorted by date; a repeated date keeps the
    /// row that appears last in the file.
    fn read_points(&self, symbol: &str) -> Result<Vec<PricePoint>, VoltargetError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| VoltargetError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| VoltargetError::Data {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();
        let column = self.price_column(&headers).ok_or_else(|| VoltargetError::Data {
            reason: format!(
                "{} has none of the price columns {}",
                path.display(),
                self.value_columns.join(", ")
            ),
        })?;

        let mut by_date = BTreeMap::new();
        let mut skipped = 0usize;

        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| VoltargetError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date = record.get(0).and_then(|d| self.parse_date(d));
            let price = record
                .get(column)
                .and_then(|p| p.trim().parse::<f64>().ok())
                .filter(|p| p.is_finite() && *p > 0.0);

            match (date, price) {
                (Some(date), Some(price)) => {
                    by_date.insert(date, price);
                }
                _ => {
                    skipped += 1;
                    log::warn!(
                        "{}: skipping row {} ({:?})",
                        path.display(),
                        line + 2,
                        record.iter().collect::<Vec<_>>()
                    );
                }
            }
        }

        log::debug!(
            "loaded {} rows for {} from {} ({} skipped)",
            by_date.len(),
            symbol,
            path.display(),
            skipped
        );

        Ok(by_date
            .into_iter()
            .map(|(date, price)| PricePoint { date, price })
            .collect())
    }
}

impl DataPort for CsvPriceAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, VoltargetError> {
        let points: Vec<PricePoint> = self
            .read_points(symbol)?
            .into_iter()
            .filter(|p| start_date.is_none_or(|s| p.date >= s))
            .filter(|p| end_date.is_none_or(|e| p.date <= e))
            .collect();

        if points.is_empty() {
            return Err(VoltargetError::NoData {
                symbol: symbol.to_string(),
            });
        }
        PriceSeries::new(points)
    }

    fn list_symbols(&self) -> Result<Vec<String>, VoltargetError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| VoltargetError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| VoltargetError::Data {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            if let Some(symbol) = name.to_string_lossy().strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, VoltargetError> {
        if !self.csv_path(symbol).exists() {
            return Ok(None);
        }
        let points = self.read_points(symbol)?;
        Ok(match (points.first(), points.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, points.len())),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        fs::write(
            path.join("AAPL.csv"),
            "date,open,close\n\
             2024-01-17,110.0,115.0\n\
             2024-01-15,100.0,105.0\n\
             2024-01-16,105.0,110.0\n",
        )
        .unwrap();
        fs::write(
            path.join("SPX.csv"),
            "Date;PX_LAST\n\
             15.01.2024;4700,5\n\
             16.01.2024;4710.0\n\
             17.01.2024;#N/A\n\
             18.01.2024;4725.0\n",
        )
        .unwrap();
        fs::write(path.join("EMPTY.csv"), "date,close\n").unwrap();
        fs::write(path.join("notes.txt"), "not a price file").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_prices_sorts_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        let series = adapter.fetch_prices("AAPL", None, None).unwrap();
        let dates: Vec<_> = series.dates().collect();
        let prices: Vec<_> = series.prices().collect();

        assert_eq!(dates, vec![date(2024, 1, 15), date(2024, 1, 16), date(2024, 1, 17)]);
        assert_eq!(prices, vec![105.0, 110.0, 115.0]);
    }

    #[test]
    fn fetch_prices_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        let d = date(2024, 1, 16);
        let series = adapter.fetch_prices("AAPL", Some(d), Some(d)).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.first_date(), Some(d));
    }

    #[test]
    fn semicolon_file_skips_bad_rows() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path).with_delimiter(b';');

        // "4700,5" and "#N/A" do not parse as numbers.
        let series = adapter.fetch_prices("SPX", None, None).unwrap();
        let prices: Vec<_> = series.prices().collect();
        assert_eq!(prices, vec![4710.0, 4725.0]);
        assert_eq!(series.first_date(), Some(date(2024, 1, 16)));
    }

    #[test]
    fn duplicate_dates_keep_last_row() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("DUP.csv"),
            "date,close\n2024-01-15,1.0\n2024-01-16,2.0\n2024-01-15,3.0\n",
        )
        .unwrap();
        let adapter = CsvPriceAdapter::new(dir.path().to_path_buf());

        let series = adapter.fetch_prices("DUP", None, None).unwrap();
        let prices: Vec<_> = series.prices().collect();
        assert_eq!(prices, vec![3.0, 2.0]);
    }

    #[test]
    fn custom_date_format_and_columns() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("X.csv"),
            "when,Close,Adj Close\n2024/01/15,10.0,9.5\n2024/01/16,11.0,10.5\n",
        )
        .unwrap();
        let adapter = CsvPriceAdapter::new(dir.path().to_path_buf())
            .with_date_format("%Y/%m/%d")
            .with_value_columns(vec!["Adj Close".to_string()]);

        let series = adapter.fetch_prices("X", None, None).unwrap();
        let prices: Vec<_> = series.prices().collect();
        assert_eq!(prices, vec![9.5, 10.5]);
    }

    #[test]
    fn missing_price_column_is_data_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("X.csv"), "date,volume\n2024-01-15,100\n").unwrap();
        let adapter = CsvPriceAdapter::new(dir.path().to_path_buf());

        let err = adapter.fetch_prices("X", None, None).unwrap_err();
        assert!(matches!(err, VoltargetError::Data { .. }));
    }

    #[test]
    fn missing_file_is_data_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        assert!(matches!(
            adapter.fetch_prices("XYZ", None, None),
            Err(VoltargetError::Data { .. })
        ));
    }

    #[test]
    fn empty_file_is_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        assert!(matches!(
            adapter.fetch_prices("EMPTY", None, None),
            Err(VoltargetError::NoData { symbol }) if symbol == "EMPTY"
        ));
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["AAPL", "EMPTY", "SPX"]);
    }

    #[test]
    fn data_range_reports_first_last_and_count() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceAdapter::new(path);

        assert_eq!(
            adapter.get_data_range("AAPL").unwrap(),
            Some((date(2024, 1, 15), date(2024, 1, 17), 3))
        );
        assert_eq!(adapter.get_data_range("EMPTY").unwrap(), None);
        assert_eq!(adapter.get_data_range("XYZ").unwrap(), None);
    }
}
