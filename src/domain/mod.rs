//! Core domain types and logic.

pub mod ohlcv;
pub mod swing;
pub mod trend;
pub mod strategy;
pub mod plan;
pub mod execution;
pub mod backtest;
pub mod metrics;
pub mod sweep;
pub mod config_validation;
pub mod error;
