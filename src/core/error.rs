//! Error types for the logging system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Two sinks registered under the same name
    #[error("Duplicate sink name: '{0}'")]
    DuplicateSink(String),

    /// No usable host identity for the batch sink
    #[error("Host identity resolution failed: {0}")]
    HostResolution(String),

    /// Remote store operation failure with context
    #[error("Store error while {operation}: {message}")]
    Store { operation: String, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a store error with operation context
    pub fn store(operation: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Store {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}
