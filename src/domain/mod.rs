//! Core domain types and logic.

pub mod catalog;
pub mod chart;
pub mod collector;
pub mod error;
pub mod form;
pub mod format;
pub mod metrics;
pub mod pool;
pub mod report;
pub mod request;
pub mod settings;
pub mod strategy;
pub mod trade;
