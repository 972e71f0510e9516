use thiserror::Error;

/// Top-level error type for the agency workspace.
///
/// Backends report every failed query or mutation through this type. The chat
/// layer never lets it reach the user; it is downgraded to a fixed reply.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AgencyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Backend returned status {status}: {body}")]
    BackendStatus { status: u16, body: String },

    #[error("Unknown field '{field}' on collection '{collection}'")]
    UnknownField { collection: String, field: String },

    #[error("Refusing to {operation} every row of '{collection}' without a filter")]
    UnfilteredMutation {
        operation: &'static str,
        collection: String,
    },

    #[error("Collection '{from}' has no relation to '{to}'")]
    InvalidRelation { from: String, to: String },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for AgencyError {
    fn from(err: toml::de::Error) -> Self {
        AgencyError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AgencyError {
    fn from(err: toml::ser::Error) -> Self {
        AgencyError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AgencyError {
    fn from(err: serde_json::Error) -> Self {
        AgencyError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for agency operations.
pub type Result<T> = std::result::Result<T, AgencyError>;
