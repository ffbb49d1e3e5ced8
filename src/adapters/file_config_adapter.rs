//! INI file configuration adapter.

use crate::domain::error::TrendQuestError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    /// Sections and keys keep their case so strategy codes survive lookup.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TrendQuestError> {
        let path = path.as_ref();
        let mut config = Ini::new_cs();
        config
            .load(path)
            .map_err(|reason| TrendQuestError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TrendQuestError> {
        let mut config = Ini::new_cs();
        config
            .read(content.to_string())
            .map_err(|reason| TrendQuestError::ConfigParse {
                file: "<inline>".into(),
                reason,
            })?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.get_string(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}
