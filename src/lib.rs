//! trendquest: stock-pool backtest configuration, analysis and reporting.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. [`pipeline`] wires one backtest
//! run together and [`cli`] is the command-line entry point.

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod pipeline;
pub mod logging;
pub mod cli;
