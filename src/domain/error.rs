//! Domain error types.

use chrono::NaiveDateTime;

/// Top-level error type for tharptrader.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("indicator not ready: need {required} bars, have {available}")]
    NotReady { required: usize, available: usize },

    #[error("degenerate risk: atr {atr} gives risk per unit {risk_per_unit}")]
    DegenerateRisk { atr: f64, risk_per_unit: f64 },

    #[error("out-of-order bar: {received} does not follow {previous}")]
    OutOfOrder {
        previous: NaiveDateTime,
        received: NaiveDateTime,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("bar data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        CoreError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&CoreError> for std::process::ExitCode {
    fn from(err: &CoreError) -> Self {
        let code: u8 = match err {
            CoreError::Io(_) => 1,
            CoreError::ConfigParse { .. } | CoreError::ConfigInvalid { .. } => 2,
            CoreError::Data { .. } => 3,
            CoreError::OutOfOrder { .. } => 4,
            CoreError::NotReady { .. } | CoreError::DegenerateRisk { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
