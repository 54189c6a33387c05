//! Outgoing request description

use common::Credential;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::TransportError;

/// Everything needed to (re)send one API call.
///
/// The `retried` flag records that the request already went through one
/// credential refresh. It is set once and never cleared, so a replayed
/// request that is rejected again is not refreshed a second time.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// Correlates log lines of the first send and its replay
    pub id: Uuid,
    pub method: Method,
    /// Path relative to the API base URL, e.g. `/bills?page=2`
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    retried: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a serializable body.
    pub fn with_body<T: Serialize>(self, body: &T) -> serde_json::Result<Self> {
        Ok(self.with_json(serde_json::to_value(body)?))
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set `Authorization: Bearer <credential>`, replacing any previous value.
    pub fn set_bearer(&mut self, credential: &Credential) -> Result<(), TransportError> {
        let mut value = HeaderValue::from_str(&credential.bearer()).map_err(|_| {
            TransportError::network("credential contains characters not allowed in a header")
        })?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    /// Current `Authorization` header value, if any.
    pub fn authorization(&self) -> Option<&str> {
        self.headers.get(AUTHORIZATION)?.to_str().ok()
    }

    pub fn retried(&self) -> bool {
        self.retried
    }

    /// Record that this request has used up its one refresh.
    pub fn mark_retried(&mut self) {
        self.retried = true;
    }

    /// Whether this request targets `path`, ignoring any query string and a
    /// trailing slash.
    pub fn targets(&self, path: &str) -> bool {
        let own = self.path.split(['?', '#']).next().unwrap_or_default();
        own.trim_end_matches('/') == path.trim_end_matches('/')
    }
}
