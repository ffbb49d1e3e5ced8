//! Domain error types.

/// Top-level error type for trendquest.
#[derive(Debug, thiserror::Error)]
pub enum TrendQuestError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown stock pool '{pool}'")]
    PoolNotFound { pool: String },

    #[error("strategy '{code}' not found, available: {}", .available.join(", "))]
    StrategyNotFound { code: String, available: Vec<String> },

    #[error("invalid parameter schema for {strategy}.{parameter}: {reason}")]
    ParameterSchema {
        strategy: String,
        parameter: String,
        reason: String,
    },

    #[error("rejected value '{value}' for {field}: {reason}")]
    RejectedInput {
        field: String,
        value: String,
        reason: String,
    },

    #[error("invalid backtest request: {reason}")]
    InvalidRequest { reason: String },

    #[error("malformed {record} row {row}: {reason}")]
    MalformedOutput {
        record: String,
        row: usize,
        reason: String,
    },

    #[error("backtest engine failed: {reason}")]
    Engine { reason: String },

    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrendQuestError {
    pub(crate) fn malformed(record: &str, row: usize, reason: impl Into<String>) -> Self {
        TrendQuestError::MalformedOutput {
            record: record.to_string(),
            row,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_request(reason: impl Into<String>) -> Self {
        TrendQuestError::InvalidRequest {
            reason: reason.into(),
        }
    }
}

impl From<&TrendQuestError> for std::process::ExitCode {
    fn from(err: &TrendQuestError) -> Self {
        let code: u8 = match err {
            TrendQuestError::Io(_)
            | TrendQuestError::Engine { .. }
            | TrendQuestError::Template(_) => 1,
            TrendQuestError::ConfigParse { .. }
            | TrendQuestError::ConfigMissing { .. }
            | TrendQuestError::ConfigInvalid { .. } => 2,
            TrendQuestError::PoolNotFound { .. } | TrendQuestError::StrategyNotFound { .. } => 3,
            TrendQuestError::ParameterSchema { .. }
            | TrendQuestError::RejectedInput { .. }
            | TrendQuestError::InvalidRequest { .. } => 4,
            TrendQuestError::MalformedOutput { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
