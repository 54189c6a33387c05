//! Transport abstraction for API requests
//!
//! Defines the `Transport` trait that decouples the authenticated client from
//! the HTTP stack. `HttpTransport` performs real exchanges with reqwest; tests
//! substitute scripted transports implementing the same trait.
//!
//! A transport performs exactly one exchange per call. It never retries and
//! never inspects credentials: a non-2xx status comes back as a
//! `TransportError` carrying the status and the decoded payload, and a failure
//! without any response comes back with no status at all.

pub mod error;
pub mod http;
pub mod request;
pub mod response;

pub use error::{Result, TransportError};
pub use http::HttpTransport;
pub use request::RequestDescriptor;
pub use response::Response;

pub use reqwest::Method;
pub use reqwest::header::{self, HeaderMap, HeaderValue};

use std::future::Future;
use std::pin::Pin;

/// A single HTTP exchange.
///
/// Uses a `Pin<Box<dyn Future>>` return type for dyn-compatibility
/// (`Arc<dyn Transport>`).
pub trait Transport: Send + Sync {
    /// Send `request` once and return the response, or the structured failure.
    fn send<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>>;
}
