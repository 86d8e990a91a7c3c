//! Error types for dashboard configuration.

use thiserror::Error;

/// Error loading or validating a dashboard configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
    /// Two figures share an id
    #[error("Duplicate figure id: {0}")]
    DuplicateFigure(String),
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Error message
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            ConfigError::DuplicateFigure("cpu".into()).to_string(),
            "Duplicate figure id: cpu"
        );
        assert_eq!(
            ConfigError::invalid("cpu.width", "must be positive").to_string(),
            "Invalid value for 'cpu.width': must be positive"
        );
    }

    #[test]
    fn test_from_yaml_error() {
        let yaml_err = serde_yaml_ng::from_str::<Vec<u32>>("[1, x").unwrap_err();
        let err: ConfigError = yaml_err.into();
        assert!(matches!(err, ConfigError::Yaml(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
