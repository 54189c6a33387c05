//! Transport failure

use serde_json::Value;

/// Failure of a single exchange.
///
/// `status` is `None` when no response was received at all (connection
/// refused, timeout, DNS). Otherwise it carries the response status and the
/// decoded payload: a JSON body as-is, a non-JSON body as a JSON string.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{detail}")]
pub struct TransportError {
    pub status: Option<u16>,
    pub detail: String,
    pub payload: Option<Value>,
}

impl TransportError {
    /// No response received.
    pub fn network(detail: impl Into<String>) -> Self {
        Self {
            status: None,
            detail: detail.into(),
            payload: None,
        }
    }

    /// A response was received with a non-success status.
    pub fn status(status: u16, payload: Option<Value>) -> Self {
        Self {
            status: Some(status),
            detail: format!("server responded with status {status}"),
            payload,
        }
    }

    /// Build from a raw error response body.
    pub fn from_body(status: u16, body: &[u8]) -> Self {
        let payload = if body.is_empty() {
            None
        } else {
            match serde_json::from_slice::<Value>(body) {
                Ok(value) => Some(value),
                Err(_) => Some(Value::String(String::from_utf8_lossy(body).into_owned())),
            }
        };
        Self::status(status, payload)
    }

    /// A response arrived but its body could not be used.
    pub fn invalid_body(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            detail: detail.into(),
            payload: None,
        }
    }

    pub fn is_network(&self) -> bool {
        self.status.is_none()
    }

    /// HTTP 401: the presented credential is missing, invalid or expired.
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }

    /// Human-readable `message` field of a JSON error payload.
    pub fn payload_message(&self) -> Option<&str> {
        self.payload
            .as_ref()?
            .get("message")?
            .as_str()
            .filter(|m| !m.trim().is_empty())
    }
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
