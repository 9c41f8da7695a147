//! Error types for reqroute

/// Result type alias using reqroute's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for reqroute operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors (missing collaborators, invalid thresholds,
    /// too few calibration samples). Fatal to the call that raised them.
    #[error("configuration error: {0}")]
    Config(String),

    /// Classifier execution errors
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Injected backend (embedding/LLM) failures
    #[error("backend error: {0}")]
    Backend(String),

    /// IO errors from persistence
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
