use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tubesent
#[derive(Error, Debug)]
pub enum TubesentError {
    /// Input did not contain a recognizable video identifier
    #[error("Invalid video link: {0}")]
    InvalidInput(String),

    /// Identifier looked valid but the platform has no such video
    #[error("Video not found: {id}")]
    NotFound { id: String },

    /// Remote API quota exhausted
    #[error("API quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Any other remote API failure
    #[error("Remote API error: {0}")]
    Remote(String),

    /// Fetch succeeded but nothing was left to analyze
    #[error("Nothing to analyze: {0}")]
    EmptyResult(String),

    /// Sentiment model invocation failed
    #[error("Model error: {0}")]
    Model(String),

    /// Operation not allowed in the current session state
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// A second analysis was requested while one is running
    #[error("An analysis is already in progress for video {video_id}")]
    AnalysisInProgress { video_id: String },

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// Session not found
    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification of pipeline failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    QuotaExceeded,
    RemoteError,
    EmptyResult,
    ModelError,
    Other,
}

impl TubesentError {
    /// Map this error onto the pipeline failure kinds
    pub fn kind(&self) -> ErrorKind {
        match self {
            TubesentError::InvalidInput(_) => ErrorKind::InvalidInput,
            TubesentError::NotFound { .. } => ErrorKind::NotFound,
            TubesentError::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            TubesentError::Remote(_) | TubesentError::Http(_) => ErrorKind::RemoteError,
            TubesentError::EmptyResult(_) => ErrorKind::EmptyResult,
            TubesentError::Model(_) => ErrorKind::ModelError,
            _ => ErrorKind::Other,
        }
    }
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for tubesent operations
pub type Result<T> = std::result::Result<T, TubesentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            TubesentError::QuotaExceeded("daily".into()).kind(),
            ErrorKind::QuotaExceeded
        );
        assert_eq!(
            TubesentError::NotFound { id: "x".into() }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            TubesentError::Config("bad".into()).kind(),
            ErrorKind::Other
        );
    }
}
