//! Error types for credential handling

/// Errors from credential and token payload handling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("token response parse error: {0}")]
    TokenParse(String),

    #[error("token response carried an empty token")]
    EmptyToken,
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
