//! Application settings read from the `[app]`, `[web]`, `[engine]` and
//! `[logging]` sections.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::error::TrendQuestError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_TITLE: &str = "TrendQuest 回测报告";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
pub const DEFAULT_RESULTS_DIR: &str = "results";
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.03;

#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub title: String,
    /// Fixed "today" used for default dates; the wall clock when unset.
    pub reference_date: Option<NaiveDate>,
    pub risk_free_rate: f64,
    pub listen: String,
    pub results_dir: PathBuf,
    pub log_filter: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            reference_date: None,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            listen: DEFAULT_LISTEN.to_string(),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            log_filter: None,
        }
    }
}

impl AppSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TrendQuestError> {
        let reference_date = match config.get_string("app", "reference_date") {
            None => None,
            Some(raw) => Some(NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                TrendQuestError::ConfigInvalid {
                    section: "app".into(),
                    key: "reference_date".into(),
                    reason: format!("'{raw}' is not a YYYY-MM-DD date"),
                }
            })?),
        };

        let risk_free_rate = config.get_double("app", "risk_free_rate", DEFAULT_RISK_FREE_RATE);
        if !risk_free_rate.is_finite() || risk_free_rate < 0.0 {
            return Err(TrendQuestError::ConfigInvalid {
                section: "app".into(),
                key: "risk_free_rate".into(),
                reason: format!("{risk_free_rate} must be a non-negative rate"),
            });
        }

        Ok(Self {
            title: config
                .get_string("app", "title")
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            reference_date,
            risk_free_rate,
            listen: config
                .get_string("web", "listen")
                .unwrap_or_else(|| DEFAULT_LISTEN.to_string()),
            results_dir: config
                .get_string("engine", "results_dir")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_DIR)),
            log_filter: config.get_string("logging", "filter"),
        })
    }
}
