//! Single-flight credential refresh
//!
//! When a request is rejected with 401, the coordinator makes sure only one
//! refresh exchange is in flight. The first rejected request leads the cycle
//! and performs the exchange; requests rejected while it is outstanding queue
//! a oneshot waiter and suspend until the cycle settles.
//!
//! States:
//! - Idle → Refreshing (first 401 while idle; that request leads)
//! - Refreshing → Idle (exchange settled and every queued waiter released)
//!
//! The check of `refreshing` and the set (or the enqueue) happen under one
//! lock acquisition with no await in between, so concurrent 401s can never
//! both observe Idle. Settlement releases the waiters and resets the flag
//! under the same lock: a request that fails after that point finds the
//! coordinator Idle and starts the next cycle instead of being dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use api_auth::{Credential, CredentialStore, REFRESH_PATH, SESSION_EXPIRED_MESSAGE};
use api_transport::{RequestDescriptor, Transport, TransportError};
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use crate::error::{ClientError, Result};
use crate::metrics;
use crate::notify::{NotificationSink, Severity};

/// Completion handle of a request queued behind the in-flight refresh.
type Waiter = oneshot::Sender<Result<Credential>>;

/// Phase of the refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

/// Invariant: `waiters` is non-empty only while `refreshing` is true.
#[derive(Default)]
struct CycleState {
    refreshing: bool,
    waiters: Vec<Waiter>,
}

enum Role {
    Leader,
    Waiter(oneshot::Receiver<Result<Credential>>),
}

/// Coordinates credential refresh for one client instance.
pub struct RefreshCoordinator {
    state: Mutex<CycleState>,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    sink: Arc<dyn NotificationSink>,
    refresh_path: String,
    wait_timeout: Option<Duration>,
}

impl RefreshCoordinator {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            state: Mutex::new(CycleState::default()),
            transport,
            store,
            sink,
            refresh_path: REFRESH_PATH.to_string(),
            wait_timeout: None,
        }
    }

    /// Use a different refresh endpoint path.
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Limit how long a queued request waits for the in-flight refresh.
    ///
    /// `None` (the default) waits until the cycle settles.
    pub fn with_wait_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn refresh_path(&self) -> &str {
        &self.refresh_path
    }

    pub fn state(&self) -> RefreshState {
        if self.lock().refreshing {
            RefreshState::Refreshing
        } else {
            RefreshState::Idle
        }
    }

    /// Number of requests currently queued behind the in-flight refresh.
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    fn lock(&self) -> MutexGuard<'_, CycleState> {
        // State is consistent between statements, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Recover from a 401 on `request`.
    ///
    /// Marks the request as retried, then either leads a refresh cycle or
    /// waits for the one in flight. Returns the credential to replay the
    /// request with, or the failure of the cycle.
    pub async fn recover(&self, request: &mut RequestDescriptor) -> Result<Credential> {
        request.mark_retried();

        let role = {
            let mut state = self.lock();
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Role::Waiter(rx)
            } else {
                state.refreshing = true;
                Role::Leader
            }
        };

        match role {
            Role::Leader => self.lead(request).await,
            Role::Waiter(rx) => self.wait(request, rx).await,
        }
    }

    async fn wait(
        &self,
        request: &RequestDescriptor,
        rx: oneshot::Receiver<Result<Credential>>,
    ) -> Result<Credential> {
        metrics::record_refresh_waiter();
        debug!(request_id = %request.id, path = %request.path, "refresh in flight, request queued");

        let outcome = match self.wait_timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(request_id = %request.id, ?limit, "gave up waiting for refresh");
                    return Err(ClientError::RefreshTimeout(limit));
                }
            },
            None => rx.await,
        };

        // The sender only disappears without a value if the cycle was torn down
        outcome.unwrap_or_else(|_| Err(abandoned()))
    }

    async fn lead(&self, request: &RequestDescriptor) -> Result<Credential> {
        let mut guard = CycleGuard {
            coordinator: self,
            settled: false,
        };
        info!(request_id = %request.id, path = %request.path, "credential rejected, refreshing");

        let outcome = self.exchange().await;
        match &outcome {
            Ok(credential) => {
                self.store.set(credential.clone());
                metrics::record_refresh("success");
            }
            Err(err) => {
                warn!(error = %err, "refresh failed, clearing session");
                self.store.clear();
                metrics::record_refresh(match err {
                    ClientError::AuthExpired => "auth_expired",
                    _ => "failed",
                });
                // One message per cycle, however many requests were waiting
                self.sink.notify(SESSION_EXPIRED_MESSAGE, Severity::Warning);
                metrics::record_notification(Severity::Warning);
            }
        }

        let released = guard.settle(&outcome);
        info!(released, success = outcome.is_ok(), "refresh cycle settled");
        outcome
    }

    /// Trade the current credential for a new one.
    ///
    /// Goes straight to the transport: a failed exchange is reported once by
    /// `lead`, never through the client's per-request error path.
    #[instrument(skip_all, fields(path = %self.refresh_path))]
    async fn exchange(&self) -> Result<Credential> {
        let mut request =
            RequestDescriptor::post(&self.refresh_path).with_json(serde_json::json!({}));
        if let Some(current) = self.store.get() {
            request
                .set_bearer(&current)
                .map_err(ClientError::RefreshFailed)?;
        }
        request.mark_retried();

        let response = self.transport.send(&request).await.map_err(|e| {
            if e.is_unauthorized() {
                ClientError::AuthExpired
            } else {
                ClientError::RefreshFailed(e)
            }
        })?;

        api_auth::credential_from_response(&response.body).map_err(|e| {
            ClientError::RefreshFailed(TransportError::invalid_body(
                response.status,
                e.to_string(),
            ))
        })
    }

    /// Release every queued waiter with `outcome` and return to Idle.
    ///
    /// Returns how many waiters were released.
    fn settle(&self, outcome: &Result<Credential>) -> usize {
        let mut state = self.lock();
        let waiters = std::mem::take(&mut state.waiters);
        let released = waiters.len();
        for waiter in waiters {
            // Err means the waiter stopped listening (timed out or cancelled)
            let _ = waiter.send(outcome.clone());
        }
        state.refreshing = false;
        released
    }
}

fn abandoned() -> ClientError {
    ClientError::RefreshFailed(TransportError::network(
        "refresh abandoned before it settled",
    ))
}

/// Settles the cycle if the leading request is dropped mid-exchange, so
/// queued requests are never left hanging and the coordinator returns to Idle.
struct CycleGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl CycleGuard<'_> {
    fn settle(&mut self, outcome: &Result<Credential>) -> usize {
        self.settled = true;
        self.coordinator.settle(outcome)
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("refresh leader dropped before settling, releasing waiters");
            metrics::record_refresh("abandoned");
            self.coordinator.settle(&Err(abandoned()));
        }
    }
}
