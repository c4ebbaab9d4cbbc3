//! Price data access port trait.

use crate::domain::error::VoltargetError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;

pub trait DataPort {
    /// Prices for `symbol`, optionally restricted to `[start, end]` inclusive.
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, VoltargetError>;

    fn list_symbols(&self) -> Result<Vec<String>, VoltargetError>;

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, VoltargetError>;
}
