use std::io;

use thiserror::Error;

/// Result type used across the timeline crates.
pub type Result<T> = std::result::Result<T, TimelineError>;

/// Canonical error representation shared by all timeline components.
#[derive(Debug, Error)]
pub enum TimelineError {
    /// Malformed owner, entity or event type. Surfaced to the caller, never retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No extractor registered for the event type key.
    #[error("unregistered event type: {0}")]
    UnregisteredEventType(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl TimelineError {
    pub fn invalid<M: Into<String>>(message: M) -> Self {
        TimelineError::InvalidArgument(message.into())
    }

    /// Whether the error stems from caller input rather than the environment.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            TimelineError::InvalidArgument(_) | TimelineError::UnregisteredEventType(_)
        )
    }
}

impl From<serde_json::Error> for TimelineError {
    fn from(err: serde_json::Error) -> Self {
        TimelineError::Serialization(err.to_string())
    }
}

impl From<sqlx::Error> for TimelineError {
    fn from(err: sqlx::Error) -> Self {
        TimelineError::Store(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for TimelineError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        TimelineError::Store(err.to_string())
    }
}

impl From<anyhow::Error> for TimelineError {
    fn from(err: anyhow::Error) -> Self {
        TimelineError::Store(err.to_string())
    }
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {key}: {value}")]
    InvalidEnvVar { key: String, value: String },
}

impl From<ConfigError> for TimelineError {
    fn from(value: ConfigError) -> Self {
        TimelineError::Config(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_are_classified() {
        assert!(TimelineError::invalid("bad owner").is_caller_error());
        assert!(TimelineError::UnregisteredEventType("tasks.task.x".into()).is_caller_error());
        assert!(!TimelineError::Store("down".into()).is_caller_error());
    }

    #[test]
    fn config_errors_convert() {
        let err: TimelineError = ConfigError::MissingEnvVar("DATABASE_URL".into()).into();
        assert!(err.to_string().contains("DATABASE_URL"));
    }
}
