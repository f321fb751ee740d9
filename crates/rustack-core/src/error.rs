//! Error types for the Rustack core.

/// Core error type for Rustack infrastructure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RustStackError {
    /// Invalid AWS account ID format.
    #[error("invalid AWS account ID: {0} (must be 12-digit numeric string)")]
    InvalidAccountId(String),

    /// A structured resource identifier could not be parsed.
    #[error("invalid ARN '{arn}': {reason}")]
    InvalidArn {
        /// The offending identifier.
        arn: String,
        /// Which segment was missing or malformed.
        reason: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for Rustack operations.
pub type RustStackResult<T> = Result<T, RustStackError>;
