//! Test doubles for the client's collaborators
//!
//! `MockTransport` routes every request through a closure and records what was
//! sent (including the `Authorization` header at send time). `RecordingSink`
//! keeps every notification so tests can count them.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

use api_auth::Credential;
use api_transport::{Method, RequestDescriptor, Response, Transport, TransportError};
use serde_json::Value;

use crate::notify::{NotificationSink, Severity};

type ResponseFuture = Pin<Box<dyn Future<Output = api_transport::Result<Response>> + Send>>;

type Handler = dyn Fn(RequestDescriptor) -> ResponseFuture + Send + Sync;

/// A request as seen by the transport.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub retried: bool,
    pub body: Option<Value>,
}

/// Scripted transport.
pub struct MockTransport {
    handler: Box<Handler>,
    log: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// Answer every request with `handler`.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(RequestDescriptor) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = api_transport::Result<Response>> + Send + 'static,
    {
        Self {
            handler: Box::new(move |request: RequestDescriptor| -> ResponseFuture {
                Box::pin(handler(request))
            }),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Everything sent so far, in send order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests sent to `path`.
    pub fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }

    /// Requests sent to `path`, in send order.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

impl Transport for MockTransport {
    fn send<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = api_transport::Result<Response>> + Send + 'a>> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                method: request.method.clone(),
                path: request.path.clone(),
                authorization: request.authorization().map(str::to_owned),
                retried: request.retried(),
                body: request.body.clone(),
            });
        (self.handler)(request.clone())
    }
}

/// Sink that remembers every notification.
#[derive(Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<(String, Severity)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<(String, Severity)> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self) -> usize {
        self.notifications().len()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, message: &str, severity: Severity) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((message.to_string(), severity));
    }
}

/// 200 response with a JSON body.
pub fn ok_json(value: Value) -> Response {
    Response::from_json(200, &value)
}

/// 401 with an empty body.
pub fn unauthorized() -> TransportError {
    TransportError::status(401, None)
}

/// Failure without any response.
pub fn network_down() -> TransportError {
    TransportError::network("connection reset by peer")
}

/// Bearer token presented by `request`, if any.
pub fn bearer_of(request: &RequestDescriptor) -> Option<String> {
    request
        .authorization()
        .and_then(Credential::from_bearer)
        .map(|c| c.expose().to_owned())
}
