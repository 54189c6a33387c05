//! reqwest-backed transport
//!
//! Joins the request path onto the configured base URL, sends the JSON body,
//! and maps the outcome onto `Response` / `TransportError`. Every request
//! carries `Content-Type: application/json` unless it sets its own.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use tracing::{debug, instrument, warn};

use crate::error::{Result, TransportError};
use crate::request::RequestDescriptor;
use crate::response::Response;
use crate::Transport;

/// HTTP transport for the API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a request path.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    #[instrument(skip_all, fields(request_id = %request.id, method = %request.method, path = %request.path))]
    async fn execute(&self, request: &RequestDescriptor) -> Result<Response> {
        let mut headers = request.headers.clone();
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let mut builder = self
            .client
            .request(request.method.clone(), self.url_for(&request.path))
            .headers(headers)
            .timeout(self.timeout);
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, timeout = e.is_timeout(), "no response from server");
            TransportError::network(format!("request failed: {e}"))
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            warn!(status = status.as_u16(), error = %e, "failed to read response body");
            TransportError::network(format!("response body read failed: {e}"))
        })?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "server returned error status");
            return Err(TransportError::from_body(status.as_u16(), &body));
        }

        debug!(status = status.as_u16(), bytes = body.len(), "request succeeded");
        Ok(Response::new(status.as_u16(), headers, body))
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> Pin<Box<dyn Future<Output = Result<Response>> + Send + 'a>> {
        Box::pin(self.execute(request))
    }
}
