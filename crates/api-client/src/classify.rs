//! Failure classification
//!
//! Splits transport failures into the three cases the client treats
//! differently: 401 (credential recovery, never a direct notification), any
//! other error status, and no response at all.

use api_auth::{NETWORK_ERROR_MESSAGE, REQUEST_FAILED_MESSAGE};
use api_transport::TransportError;

use crate::error::ClientError;

/// How the client reacts to a failed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// 401: hand over to the refresh coordinator
    Unauthorized,
    /// Any other error status: notify and propagate
    Http,
    /// No response received: notify and propagate
    Network,
}

pub fn classify(error: &TransportError) -> FailureKind {
    match error.status {
        None => FailureKind::Network,
        Some(401) => FailureKind::Unauthorized,
        Some(_) => FailureKind::Http,
    }
}

/// Text shown to the user for a non-401 failure.
///
/// Error responses use their payload's `message` field when present.
pub fn user_message(error: &TransportError) -> &str {
    match classify(error) {
        FailureKind::Network => NETWORK_ERROR_MESSAGE,
        FailureKind::Http | FailureKind::Unauthorized => {
            error.payload_message().unwrap_or(REQUEST_FAILED_MESSAGE)
        }
    }
}

/// Map a non-401 failure onto the client taxonomy.
///
/// A 401 reaching this point has exhausted recovery and maps to `AuthExpired`.
pub fn into_client_error(error: TransportError) -> ClientError {
    match classify(&error) {
        FailureKind::Network => ClientError::Network(error),
        FailureKind::Http => ClientError::Http(error),
        FailureKind::Unauthorized => ClientError::AuthExpired,
    }
}
