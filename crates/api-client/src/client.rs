//! Authenticated API client
//!
//! Wraps a `Transport`: attaches the stored credential to every request,
//! hands 401s to the `RefreshCoordinator` and replays the request once with
//! the refreshed credential, and reports every other failure through the
//! `NotificationSink` exactly once.
//!
//! 401s never notify directly. Messaging for credential failures belongs to
//! the refresh cycle, so a burst of rejected requests produces one message.

use std::sync::Arc;
use std::time::Duration;

use api_auth::{Credential, CredentialStore, REFRESH_PATH, SESSION_EXPIRED_MESSAGE};
use api_transport::{RequestDescriptor, Response, Transport};
use tracing::{debug, instrument, warn};

use crate::classify::{self, FailureKind};
use crate::coordinator::RefreshCoordinator;
use crate::error::{ClientError, Result};
use crate::metrics;
use crate::notify::{NotificationSink, Severity};

/// Client behaviour knobs. Defaults match the API's conventions.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Path of the refresh exchange endpoint
    pub refresh_path: String,
    /// How long a request queued behind a refresh may wait; `None` waits forever
    pub refresh_wait_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            refresh_path: REFRESH_PATH.to_string(),
            refresh_wait_timeout: None,
        }
    }
}

/// HTTP client that manages the bearer credential for its callers.
pub struct AuthenticatedClient {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    sink: Arc<dyn NotificationSink>,
    coordinator: RefreshCoordinator,
}

impl AuthenticatedClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self::with_config(transport, store, sink, ClientConfig::default())
    }

    pub fn with_config(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        sink: Arc<dyn NotificationSink>,
        config: ClientConfig,
    ) -> Self {
        let coordinator = RefreshCoordinator::new(transport.clone(), store.clone(), sink.clone())
            .with_refresh_path(config.refresh_path)
            .with_wait_timeout(config.refresh_wait_timeout);
        Self {
            transport,
            store,
            sink,
            coordinator,
        }
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    pub fn credential_store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub(crate) fn notify(&self, message: &str, severity: Severity) {
        self.sink.notify(message, severity);
        metrics::record_notification(severity);
    }

    /// Send `request` with the current credential.
    ///
    /// - 2xx: the response, unchanged
    /// - 401 from the refresh endpoint: credential cleared, one notification, `AuthExpired`
    /// - 401 on a request already replayed once: `AuthExpired`, no further refresh
    /// - other 401: refresh (or wait for the refresh in flight), then replay once
    /// - anything else: one notification, then `Http` or `Network`
    #[instrument(skip_all, fields(request_id = %request.id, method = %request.method, path = %request.path))]
    pub async fn send(&self, mut request: RequestDescriptor) -> Result<Response> {
        let mut replay_with: Option<Credential> = None;

        loop {
            // Read at send time; a replay uses the credential its refresh produced
            let credential = replay_with.take().or_else(|| self.store.get());
            if let Some(credential) = credential.filter(|c| !c.is_empty()) {
                request
                    .set_bearer(&credential)
                    .map_err(|e| ClientError::InvalidRequest(e.detail))?;
            }

            let failure = match self.transport.send(&request).await {
                Ok(response) => {
                    metrics::record_request(if request.retried() {
                        "replayed"
                    } else {
                        "success"
                    });
                    return Ok(response);
                }
                Err(failure) => failure,
            };

            match classify::classify(&failure) {
                FailureKind::Unauthorized => {}
                FailureKind::Http | FailureKind::Network => {
                    let message = classify::user_message(&failure).to_string();
                    debug!(status = ?failure.status, error = %failure, "request failed");
                    self.notify(&message, Severity::Error);
                    metrics::record_request("error");
                    return Err(classify::into_client_error(failure));
                }
            }

            if request.targets(self.coordinator.refresh_path()) {
                warn!("refresh endpoint rejected the credential, clearing session");
                self.store.clear();
                self.notify(SESSION_EXPIRED_MESSAGE, Severity::Warning);
                metrics::record_request("auth_expired");
                return Err(ClientError::AuthExpired);
            }

            if request.retried() {
                warn!("replayed request rejected again");
                metrics::record_request("auth_expired");
                return Err(ClientError::AuthExpired);
            }

            match self.coordinator.recover(&mut request).await {
                Ok(credential) => {
                    debug!("replaying with refreshed credential");
                    replay_with = Some(credential);
                }
                Err(err) => {
                    metrics::record_request("refresh_failed");
                    return Err(err);
                }
            }
        }
    }

    /// Exchange the current credential for a new one right away.
    ///
    /// Goes through `send`, so a 401 from the refresh endpoint clears the
    /// session like any other rejected refresh.
    pub async fn refresh_now(&self) -> Result<Credential> {
        let request = RequestDescriptor::post(self.coordinator.refresh_path())
            .with_json(serde_json::json!({}));
        let response = self.send(request).await?;
        let credential = api_auth::credential_from_response(&response.body)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        self.store.set(credential.clone());
        Ok(credential)
    }
}
