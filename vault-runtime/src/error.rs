use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("RPC error in {method}: {message}")]
    RpcError { method: String, message: String },

    #[error("{method} reverted: {}", reason.as_deref().unwrap_or("<no reason>"))]
    Reverted {
        method: String,
        reason: Option<String>,
    },

    #[error("Assertion failed [{check}]: {detail}")]
    AssertionFailed { check: String, detail: String },

    #[error("{method} succeeded, expected revert with '{expected}'")]
    UnexpectedSuccess { method: String, expected: String },

    #[error("{method} reverted with '{actual}', expected '{expected}'")]
    RevertMismatch {
        method: String,
        expected: String,
        actual: String,
    },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl LifecycleError {
    /// Revert reason carried by this error, if it is a revert.
    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            LifecycleError::Reverted { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }

    pub fn is_revert(&self) -> bool {
        matches!(self, LifecycleError::Reverted { .. })
    }
}

impl From<serde_json::Error> for LifecycleError {
    fn from(e: serde_json::Error) -> Self {
        LifecycleError::SerializationError(e.to_string())
    }
}

impl From<toml::de::Error> for LifecycleError {
    fn from(e: toml::de::Error) -> Self {
        LifecycleError::ConfigError(e.to_string())
    }
}

impl From<std::io::Error> for LifecycleError {
    fn from(e: std::io::Error) -> Self {
        LifecycleError::IoError(e.to_string())
    }
}
