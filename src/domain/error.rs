//! Domain error types.

/// Top-level error type for voltarget.
#[derive(Debug, thiserror::Error)]
pub enum VoltargetError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    InvalidConfig {
        section: String,
        key: String,
        reason: String,
    },

    #[error("insufficient history: have {have} returns, need {need}")]
    InsufficientHistory { have: usize, need: usize },

    #[error("invalid price series: {reason}")]
    InvalidSeries { reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl VoltargetError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        VoltargetError::InvalidConfig {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&VoltargetError> for std::process::ExitCode {
    fn from(err: &VoltargetError) -> Self {
        let code: u8 = match err {
            VoltargetError::Io(_) => 1,
            VoltargetError::ConfigParse { .. }
            | VoltargetError::ConfigMissing { .. }
            | VoltargetError::InvalidConfig { .. } => 2,
            VoltargetError::Data { .. } | VoltargetError::NoData { .. } => 3,
            VoltargetError::InsufficientHistory { .. } | VoltargetError::InvalidSeries { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_history_message() {
        let err = VoltargetError::InsufficientHistory { have: 3, need: 20 };
        assert_eq!(
            err.to_string(),
            "insufficient history: have 3 returns, need 20"
        );
    }

    #[test]
    fn invalid_config_helper_fills_fields() {
        let err = VoltargetError::invalid("sizing", "leverage_cap", "must be positive");
        assert!(matches!(
            err,
            VoltargetError::InvalidConfig { ref section, ref key, .. }
                if section == "sizing" && key == "leverage_cap"
        ));
        assert_eq!(
            err.to_string(),
            "invalid config value [sizing] leverage_cap: must be positive"
        );
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: VoltargetError = io.into();
        assert!(matches!(err, VoltargetError::Io(_)));
    }
}
