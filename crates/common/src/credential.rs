//! Bearer credential

use std::fmt;
use zeroize::Zeroize;

/// Prefix of an `Authorization` header carrying a bearer credential.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Opaque bearer token issued by the API.
///
/// Redacted in Debug/Display so it never ends up in logs, and wiped from
/// memory on drop. The client reads it from the credential store at request
/// time and never keeps a copy across requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Expose the raw token (use sparingly)
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// An empty token is treated as no credential at all.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// `Authorization` header value for this credential.
    pub fn bearer(&self) -> String {
        format!("{BEARER_PREFIX}{}", self.0)
    }

    /// Extract the credential from an `Authorization` header value.
    ///
    /// Returns `None` for other schemes or an empty token.
    pub fn from_bearer(header: &str) -> Option<Self> {
        let token = header.strip_prefix(BEARER_PREFIX)?.trim();
        if token.is_empty() {
            None
        } else {
            Some(Self::new(token))
        }
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential([REDACTED])")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
