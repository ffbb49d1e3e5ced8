//! Inputs of the report renderer.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::domain::chart::ChartArtifact;
use crate::domain::metrics::{SummaryMetric, SymbolResult};

/// Everything the HTML report shows, keyed by symbol where per-symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportInput {
    pub title: String,
    pub generated_at: NaiveDateTime,
    /// Ordered label/value pairs describing the run.
    pub config: Vec<(String, String)>,
    pub summary: Vec<SummaryMetric>,
    pub results: BTreeMap<String, SymbolResult>,
    pub charts: BTreeMap<String, ChartArtifact>,
    pub distributions: BTreeMap<String, ChartArtifact>,
    pub summary_chart: Option<ChartArtifact>,
}
