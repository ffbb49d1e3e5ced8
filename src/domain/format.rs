//! Number formatting shared by the report, the CSV export and the CLI.

/// `0.1234` -> `"12.34%"`.
pub fn percent(value: f64) -> String {
    // -0.0 would otherwise print as "-0.00%"
    format!("{:.2}%", value * 100.0 + 0.0)
}

pub fn decimal(value: f64) -> String {
    format!("{:.2}", value + 0.0)
}

/// CSS class for a signed figure. Zero counts as negative.
pub fn color_class(value: f64) -> &'static str {
    if value > 0.0 { "positive" } else { "negative" }
}
