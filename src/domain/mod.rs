//! Core domain types and logic.

pub mod price;
pub mod volatility;
pub mod leverage;
pub mod trend;
pub mod gate;
pub mod constraint;
pub mod simulation;
pub mod metrics;
pub mod benchmark;
pub mod backtest;
pub mod config;
pub mod config_validation;
pub mod error;
