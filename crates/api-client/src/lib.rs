//! Authenticated API client with single-flight credential refresh
//!
//! `AuthenticatedClient` sends requests over a `Transport` with the stored
//! bearer credential attached. When the API answers 401, the
//! `RefreshCoordinator` makes sure exactly one refresh exchange runs no
//! matter how many requests failed at once; every affected request is
//! replayed once with the new credential, or all of them fail together with
//! a single "session expired" notification.
//!
//! Collaborators are injected as trait objects:
//! - `Transport` (api-transport): one HTTP exchange per call
//! - `CredentialStore` (api-auth): current credential, read at send time
//! - `NotificationSink`: user-visible messages

pub mod classify;
pub mod client;
pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod notify;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{AuthenticatedClient, ClientConfig};
pub use coordinator::{RefreshCoordinator, RefreshState};
pub use error::{ClientError, Result};
pub use notify::{NotificationSink, Severity, TracingSink};
pub use session::Session;
