//! Client error taxonomy

use std::time::Duration;

use api_transport::TransportError;

/// Why a request through the authenticated client failed.
///
/// Cloneable because one refresh outcome is delivered to every request
/// that was waiting on it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// The session can't be recovered: the refresh endpoint rejected the
    /// credential, or a request that was already replayed once got 401 again.
    #[error("session expired")]
    AuthExpired,

    /// The refresh exchange failed for a reason other than a 401.
    #[error("credential refresh failed: {0}")]
    RefreshFailed(TransportError),

    /// A response was received with a non-401 error status.
    #[error("request failed: {0}")]
    Http(TransportError),

    /// No response was received.
    #[error("network error: {0}")]
    Network(TransportError),

    /// Gave up waiting for an in-flight refresh (only with a configured wait limit).
    #[error("timed out after {0:?} waiting for credential refresh")]
    RefreshTimeout(Duration),

    /// The request could not be built (e.g. credential not a valid header value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A successful response body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    /// HTTP status of the underlying response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::RefreshFailed(e) | ClientError::Http(e) | ClientError::Network(e) => {
                e.status
            }
            _ => None,
        }
    }

    /// Errors after which the user has to sign in again.
    pub fn ends_session(&self) -> bool {
        matches!(self, ClientError::AuthExpired | ClientError::RefreshFailed(_))
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
