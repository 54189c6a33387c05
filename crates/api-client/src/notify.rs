//! User-visible notifications
//!
//! The client reports failures through a `NotificationSink` instead of
//! rendering anything itself. How a message is shown (toast, status line,
//! log) is up to the sink.

use std::fmt;

use tracing::{error, info, warn};

/// Severity of a user-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Surfaces one message to the user.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Sink that reports notifications as tracing events.
///
/// Default sink for headless callers such as the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => info!(notification = message, "notify"),
            Severity::Warning => warn!(notification = message, "notify"),
            Severity::Error => error!(notification = message, "notify"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(Severity::Info.label(), "info");
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::Error.to_string(), "error");
    }

    #[test]
    fn tracing_sink_accepts_every_severity() {
        let sink: &dyn NotificationSink = &TracingSink;
        sink.notify("saved", Severity::Info);
        sink.notify("Session expired, please sign in again", Severity::Warning);
        sink.notify("Request failed", Severity::Error);
    }
}
