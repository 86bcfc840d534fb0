//! Domain error types.
//!
//! Only malformed or insufficient input is reported as an error. Degenerate
//! swing pairs, undefined trend values and plans that never fill are normal
//! outcomes of a backtest and never reach this type.

/// Top-level error type for swingtrader.
#[derive(Debug, thiserror::Error)]
pub enum SwingtraderError {
    #[error("bar series is empty")]
    EmptyInput,

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("bar times must be strictly increasing (violated at index {index})")]
    NonMonotonicTime { index: usize },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("trend series has {trend} values but there are {bars} bars")]
    TrendLengthMismatch { bars: usize, trend: usize },

    #[error("trend filter is enabled but no trend series was supplied")]
    MissingTrend,

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

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SwingtraderError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        SwingtraderError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// True for the input-validation failures raised by the engine itself.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            SwingtraderError::EmptyInput
                | SwingtraderError::InsufficientData { .. }
                | SwingtraderError::NonMonotonicTime { .. }
                | SwingtraderError::InvalidParameter { .. }
                | SwingtraderError::TrendLengthMismatch { .. }
                | SwingtraderError::MissingTrend
        )
    }

    /// Process exit status for this error category.
    pub fn exit_status(&self) -> u8 {
        match self {
            SwingtraderError::Io(_) => 1,
            SwingtraderError::ConfigParse { .. }
            | SwingtraderError::ConfigMissing { .. }
            | SwingtraderError::ConfigInvalid { .. } => 2,
            SwingtraderError::Data { .. } => 3,
            SwingtraderError::EmptyInput
            | SwingtraderError::InsufficientData { .. }
            | SwingtraderError::NonMonotonicTime { .. }
            | SwingtraderError::InvalidParameter { .. }
            | SwingtraderError::TrendLengthMismatch { .. }
            | SwingtraderError::MissingTrend => 5,
            SwingtraderError::Report { .. } => 6,
        }
    }
}

impl From<&SwingtraderError> for std::process::ExitCode {
    fn from(err: &SwingtraderError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
