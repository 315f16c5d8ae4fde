//! Error types for codesync - thin wrapper over the crate-level errors

use codesync_core::OpError;
use miette::Diagnostic;

use crate::config::ConfigError;

/// Main error type for codesync operations
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum CodesyncError {
    /// An operation did not fit the text it was applied to
    #[error(transparent)]
    #[diagnostic(
        code(codesync::op::malformed),
        help("the operation was computed against a different document version")
    )]
    Op(#[from] OpError),

    /// Serialization/deserialization error
    #[error(transparent)]
    #[diagnostic_source]
    Serde(#[from] SerDeError),

    /// Configuration error
    #[error(transparent)]
    #[diagnostic_source]
    Config(#[from] ConfigError),

    /// IO error
    #[error(transparent)]
    #[diagnostic(code(codesync::io))]
    Io(#[from] std::io::Error),
}

/// Serialization/deserialization errors
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum SerDeError {
    #[error("invalid wire message: {0}")]
    #[diagnostic(code(codesync::wire::json))]
    Json(#[from] serde_json::Error),
}

impl From<serde_json::Error> for CodesyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(SerDeError::Json(err))
    }
}
