//! Configuration access port.

/// Read-only lookup over a sectioned configuration source. Blank values
/// read as absent.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `default` when the key is absent or not a number.
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;

    /// Comma-separated value as trimmed, non-empty items, in order.
    fn get_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        self.get_string(section, key).map(|value| {
            value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }
}
