//! Client metrics
//!
//! Counters emitted through the `metrics` facade; they are no-ops until the
//! embedding application installs a recorder.
//!
//! - `api_client_requests_total` (counter): label `outcome`
//! - `api_client_refresh_total` (counter): label `outcome`
//! - `api_client_refresh_waiters_total` (counter): requests queued behind a refresh
//! - `api_client_notifications_total` (counter): label `severity`

use crate::notify::Severity;

/// Record a finished `send` call.
pub fn record_request(outcome: &'static str) {
    metrics::counter!("api_client_requests_total", "outcome" => outcome).increment(1);
}

/// Record a settled refresh exchange (`success`, `auth_expired`, `failed`, `abandoned`).
pub fn record_refresh(outcome: &'static str) {
    metrics::counter!("api_client_refresh_total", "outcome" => outcome).increment(1);
}

/// Record a request that queued behind an in-flight refresh.
pub fn record_refresh_waiter() {
    metrics::counter!("api_client_refresh_waiters_total").increment(1);
}

pub fn record_notification(severity: Severity) {
    metrics::counter!("api_client_notifications_total", "severity" => severity.label())
        .increment(1);
}
